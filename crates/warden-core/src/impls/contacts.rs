use async_trait::async_trait;

use crate::ports::{Contact, ContactDirectory};

/// Contact directory holding at most one fixed contact.
#[derive(Debug, Clone, Default)]
pub struct StaticContactDirectory {
    contact: Option<Contact>,
}

impl StaticContactDirectory {
    pub fn new(contact: Option<Contact>) -> Self {
        Self { contact }
    }
}

#[async_trait]
impl ContactDirectory for StaticContactDirectory {
    async fn primary_contact(&self) -> Option<Contact> {
        self.contact.clone()
    }
}
