use crate::{
    error::*,
    repo_name::RepoName,
    spec::{RepoSpec, Visibility},
    transport::{expect, unexpected, Method, Rest},
};
use serde_json::{json, Value};

/// Root of the repository API
pub(crate) const API_ROOT: &str = "/api/v1/repository";

/// Build the API path addressing a single repository.
///
/// Shared with the mirror client, which appends its sub-resource suffix.
pub(crate) fn repo_path(repo: &RepoName) -> String {
    format!("{}/{}", API_ROOT, repo)
}

/// A client for the `/api/v1/repository` API endpoint
///
/// See the [Quay API reference](https://docs.quay.io/api/swagger/) for the
/// endpoint documentation.
pub struct RepositoryClient<'a, R> {
    rest: &'a R,
}

impl<'a, R: Rest> RepositoryClient<'a, R> {
    pub fn new(rest: &'a R) -> Self {
        RepositoryClient { rest }
    }

    /// Fetch the specified repository and report whether it exists.
    ///
    /// ```text
    /// GET /api/v1/repository/{repository}
    /// ```
    ///
    /// Status 200 means the repository exists, 404 that it does not; any
    /// other status is an error.
    pub fn exists(&self, repo: &RepoName) -> Result<bool> {
        let path = repo_path(repo);
        let res = self.rest.get(&path)?;
        match res.status_code {
            200 => Ok(true),
            404 => Ok(false),
            _ => Err(unexpected(Method::Get, &path, res)),
        }
    }

    /// Create a new repository.
    ///
    /// ```text
    /// POST /api/v1/repository
    /// ```
    pub fn create(&self, spec: &RepoSpec) -> Result<Option<Value>> {
        let body = serde_json::to_value(spec)?;
        let res = self.rest.post(API_ROOT, Some(&body))?;
        expect(Method::Post, API_ROOT, res, 201)
    }

    /// Delete a repository.
    ///
    /// ```text
    /// DELETE /api/v1/repository/{repository}
    /// ```
    pub fn delete(&self, repo: &RepoName) -> Result<Option<Value>> {
        let path = repo_path(repo);
        let res = self.rest.delete(&path)?;
        expect(Method::Delete, &path, res, 204)
    }

    /// Update the description of a repository.
    ///
    /// ```text
    /// PUT /api/v1/repository/{repository}
    /// ```
    pub fn update_description(&self, repo: &RepoName, description: &str) -> Result<Option<Value>> {
        let path = repo_path(repo);
        let body = json!({ "description": description });
        let res = self.rest.put(&path, Some(&body))?;
        expect(Method::Put, &path, res, 200)
    }

    /// Change the visibility of a repository.
    ///
    /// ```text
    /// POST /api/v1/repository/{repository}/changevisibility
    /// ```
    pub fn change_visibility(
        &self,
        repo: &RepoName,
        visibility: Visibility,
    ) -> Result<Option<Value>> {
        let path = format!("{}/changevisibility", repo_path(repo));
        let body = json!({ "visibility": visibility });
        let res = self.rest.post(&path, Some(&body))?;
        expect(Method::Post, &path, res, 201)
    }

    /// Change the content-trust flag of a repository.
    ///
    /// ```text
    /// POST /api/v1/repository/{repository}/changetrust
    /// ```
    pub fn change_trust(&self, repo: &RepoName, trust_enabled: bool) -> Result<Option<Value>> {
        let path = format!("{}/changetrust", repo_path(repo));
        let body = json!({ "trust_enabled": trust_enabled });
        let res = self.rest.post(&path, Some(&body))?;
        expect(Method::Post, &path, res, 201)
    }

    /// Fetch the list of repositories visible to the current user.
    ///
    /// ```text
    /// GET /api/v1/repository
    /// ```
    pub fn list_all(&self) -> Result<Option<Value>> {
        let res = self.rest.get(API_ROOT)?;
        expect(Method::Get, API_ROOT, res, 200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::FakeRest;
    use serde_json::json;

    fn widget() -> RepoName {
        RepoName::parse("team/widget").unwrap()
    }

    #[test]
    fn exists_maps_200_and_404() -> Result<()> {
        let rest = FakeRest::new(vec![(200, None), (404, None)]);
        let repos = RepositoryClient::new(&rest);
        assert!(repos.exists(&widget())?);
        assert!(!repos.exists(&widget())?);

        let calls = rest.calls();
        assert_eq!(calls[0].0, Method::Get);
        assert_eq!(calls[0].1, "/api/v1/repository/team/widget");
        Ok(())
    }

    #[test]
    fn exists_other_statuses_are_errors() {
        for status in [500, 403] {
            let rest = FakeRest::new(vec![(status, None)]);
            let repos = RepositoryClient::new(&rest);
            let err = repos.exists(&widget()).unwrap_err();
            assert!(matches!(
                err,
                Error::UnexpectedResponse { status: s, .. } if s == status
            ));
        }
    }

    #[test]
    fn create_posts_spec_body() -> Result<()> {
        let rest = FakeRest::new(vec![(201, Some(json!({"namespace": "team"})))]);
        let repos = RepositoryClient::new(&rest);
        let spec = RepoSpec {
            namespace: "team".to_string(),
            repository: "widget".to_string(),
            visibility: Visibility::Public,
            repo_kind: Default::default(),
            description: String::new(),
        };
        let data = repos.create(&spec)?;
        assert_eq!(data.unwrap()["namespace"], "team");

        let calls = rest.calls();
        assert_eq!(calls[0].0, Method::Post);
        assert_eq!(calls[0].1, "/api/v1/repository");
        let body = calls[0].2.as_ref().unwrap();
        assert_eq!(body["repository"], "widget");
        assert_eq!(body["visibility"], "public");
        Ok(())
    }

    #[test]
    fn delete_expects_204() {
        let rest = FakeRest::new(vec![(404, None)]);
        let repos = RepositoryClient::new(&rest);
        assert!(repos.delete(&widget()).is_err());
    }

    #[test]
    fn change_trust_body() -> Result<()> {
        let rest = FakeRest::new(vec![(201, None)]);
        let repos = RepositoryClient::new(&rest);
        repos.change_trust(&widget(), true)?;

        let calls = rest.calls();
        assert_eq!(calls[0].1, "/api/v1/repository/team/widget/changetrust");
        assert_eq!(calls[0].2, Some(json!({"trust_enabled": true})));
        Ok(())
    }

    #[test]
    fn change_visibility_path_and_body() -> Result<()> {
        let rest = FakeRest::new(vec![(201, None)]);
        let repos = RepositoryClient::new(&rest);
        repos.change_visibility(&widget(), Visibility::Private)?;

        let calls = rest.calls();
        assert_eq!(
            calls[0].1,
            "/api/v1/repository/team/widget/changevisibility"
        );
        assert_eq!(calls[0].2, Some(json!({"visibility": "private"})));
        Ok(())
    }

    #[test]
    fn list_all_returns_payload() -> Result<()> {
        let payload = json!({"repositories": [{"name": "widget"}]});
        let rest = FakeRest::new(vec![(200, Some(payload.clone()))]);
        let repos = RepositoryClient::new(&rest);
        assert_eq!(repos.list_all()?, Some(payload));
        Ok(())
    }
}
