use crate::{
    error::*,
    repo_name::RepoName,
    repository::repo_path,
    spec::MirrorSpec,
    transport::{expect, Method, Rest},
};
use serde_json::Value;

fn mirror_path(repo: &RepoName) -> String {
    format!("{}/mirror", repo_path(repo))
}

/// A client for the `/api/v1/repository/{repository}/mirror` API endpoint
///
/// Composed with [`RepositoryClient`](crate::repository::RepositoryClient)
/// over the same transport; only the path building is shared.
pub struct MirrorClient<'a, R> {
    rest: &'a R,
}

impl<'a, R: Rest> MirrorClient<'a, R> {
    pub fn new(rest: &'a R) -> Self {
        MirrorClient { rest }
    }

    /// Create the mirror configuration of a repository.
    ///
    /// ```text
    /// POST /api/v1/repository/{repository}/mirror
    /// ```
    pub fn create(&self, repo: &RepoName, spec: &MirrorSpec) -> Result<Option<Value>> {
        let path = mirror_path(repo);
        let body = serde_json::to_value(spec)?;
        let res = self.rest.post(&path, Some(&body))?;
        expect(Method::Post, &path, res, 201)
    }

    /// Fetch the mirror configuration of a repository.
    ///
    /// ```text
    /// GET /api/v1/repository/{repository}/mirror
    /// ```
    pub fn fetch(&self, repo: &RepoName) -> Result<Option<Value>> {
        let path = mirror_path(repo);
        let res = self.rest.get(&path)?;
        expect(Method::Get, &path, res, 200)
    }

    /// Update the mirror configuration of a repository.
    ///
    /// ```text
    /// PUT /api/v1/repository/{repository}/mirror
    /// ```
    pub fn update(&self, repo: &RepoName, spec: &MirrorSpec) -> Result<Option<Value>> {
        let path = mirror_path(repo);
        let body = serde_json::to_value(spec)?;
        let res = self.rest.put(&path, Some(&body))?;
        expect(Method::Put, &path, res, 200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{spec::RootRule, transport::testing::FakeRest};
    use serde_json::json;

    fn widget() -> RepoName {
        RepoName::parse("team/widget").unwrap()
    }

    // The desired spec must actually leave the client as the request body.
    #[test]
    fn create_sends_body() -> Result<()> {
        let rest = FakeRest::new(vec![(201, None)]);
        let mirrors = MirrorClient::new(&rest);
        let spec = MirrorSpec {
            is_enabled: true,
            external_reference: Some("docker.io/library/alpine".to_string()),
            root_rule: Some(RootRule::tag_glob_csv("latest")),
            sync_interval: Some(86400),
            ..Default::default()
        };
        mirrors.create(&widget(), &spec)?;

        let calls = rest.calls();
        assert_eq!(calls[0].0, Method::Post);
        assert_eq!(calls[0].1, "/api/v1/repository/team/widget/mirror");
        let body = calls[0].2.as_ref().unwrap();
        assert_eq!(body["is_enabled"], true);
        assert_eq!(body["external_reference"], "docker.io/library/alpine");
        assert_eq!(body["sync_interval"], 86400);
        Ok(())
    }

    #[test]
    fn fetch_returns_config() -> Result<()> {
        let config = json!({"is_enabled": true, "sync_interval": 86400});
        let rest = FakeRest::new(vec![(200, Some(config.clone()))]);
        let mirrors = MirrorClient::new(&rest);
        assert_eq!(mirrors.fetch(&widget())?, Some(config));

        let calls = rest.calls();
        assert_eq!(calls[0].0, Method::Get);
        assert_eq!(calls[0].1, "/api/v1/repository/team/widget/mirror");
        Ok(())
    }

    #[test]
    fn update_expects_200() {
        let rest = FakeRest::new(vec![(409, Some(json!({"error_message": "conflict"})))]);
        let mirrors = MirrorClient::new(&rest);
        let err = mirrors
            .update(&widget(), &MirrorSpec::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedResponse { status: 409, .. }
        ));
    }
}
