use serde::{Deserialize, Serialize};

use crate::types::{AccountId, ClientId, Username};

/// A FedCM account as returned by the accounts endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default)]
    pub approved_clients: Vec<ClientId>,
}

impl Account {
    /// Create an account with only the required fields.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: AccountId(id.into()),
            name: name.into(),
            email: email.into(),
            given_name: None,
            picture: None,
            approved_clients: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_given_name(mut self, given_name: impl Into<String>) -> Self {
        self.given_name = Some(given_name.into());
        self
    }

    #[must_use]
    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }

    #[must_use]
    pub fn with_approved_clients(mut self, clients: Vec<ClientId>) -> Self {
        self.approved_clients = clients;
        self
    }
}

/// Body of the accounts endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsResponse {
    pub accounts: Vec<Account>,
}

/// Derives two synthetic accounts from a session's username.
///
/// Nothing is stored: the same username always yields the same two accounts,
/// personal first, work second.
#[derive(Debug, Clone)]
pub struct MockAccountDirectory {
    picture_url: String,
}

impl MockAccountDirectory {
    #[must_use]
    pub fn new(picture_url: impl Into<String>) -> Self {
        Self {
            picture_url: picture_url.into(),
        }
    }

    /// Accounts for the signed-in user, or an empty list when there is none.
    #[must_use]
    pub fn list_accounts(&self, username: Option<&Username>) -> Vec<Account> {
        let Some(username) = username else {
            return Vec::new();
        };
        let u = username.as_str();

        vec![
            Account::new(format!("{u}-personal"), u, format!("{u}@example.com"))
                .with_given_name(u)
                .with_picture(&self.picture_url),
            Account::new(
                format!("{u}-work"),
                format!("{u} (Work)"),
                format!("{u}@work.example.com"),
            )
            .with_given_name(u)
            .with_picture(&self.picture_url),
        ]
    }
}
