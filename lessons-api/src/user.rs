/// Author identity as the server snapshots it onto comments and replies
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub photo: Option<String>,
}

impl User {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> User {
        User {
            email: email.into(),
            name: name.into(),
            photo: None,
        }
    }
}
