use serde::{Deserialize, Serialize};

/// Authenticated GitHub account (`GET /user`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoOwner {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// Repository summary as listed by GitHub
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub owner: RepoOwner,
    pub private: bool,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Actions secret metadata; GitHub never returns values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubSecret {
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretList {
    pub total_count: u64,
    pub secrets: Vec<GitHubSecret>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepoSearchResponse {
    pub items: Vec<GitHubRepo>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PutSecretBody<'a> {
    pub encrypted_value: &'a str,
    pub key_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_deserializes_from_api_shape() {
        let json = r#"{
            "id": 1296269,
            "node_id": "MDEwOlJlcG9zaXRvcnkxMjk2MjY5",
            "name": "Hello-World",
            "full_name": "octocat/Hello-World",
            "owner": {"login": "octocat", "id": 1, "avatar_url": "https://github.com/images/error/octocat_happy.gif"},
            "private": false,
            "html_url": "https://github.com/octocat/Hello-World",
            "updated_at": "2011-01-26T19:14:43Z"
        }"#;
        let repo: GitHubRepo = serde_json::from_str(json).unwrap();
        assert_eq!(repo.full_name, "octocat/Hello-World");
        assert_eq!(repo.owner.login, "octocat");
        assert!(!repo.private);
    }

    #[test]
    fn test_secret_list_deserializes() {
        let json = r#"{
            "total_count": 2,
            "secrets": [
                {"name": "GH_TOKEN", "created_at": "2019-08-10T14:59:22Z", "updated_at": "2020-01-10T14:59:22Z"},
                {"name": "GIST_ID", "created_at": "2020-01-10T10:59:22Z", "updated_at": "2020-01-11T11:59:22Z"}
            ]
        }"#;
        let list: SecretList = serde_json::from_str(json).unwrap();
        assert_eq!(list.total_count, 2);
        assert_eq!(list.secrets[1].name, "GIST_ID");
    }

    #[test]
    fn test_put_body_shape() {
        let body = PutSecretBody {
            encrypted_value: "c2VhbGVk",
            key_id: "012345678912345678",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["encrypted_value"], "c2VhbGVk");
        assert_eq!(value["key_id"], "012345678912345678");
    }
}
