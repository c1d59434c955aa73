use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::vector::{CONTACTS_COLLECTION, EMAILS_COLLECTION, TEMPLATES_COLLECTION};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
	Message,
	Contact,
	Template,
}
impl DocumentKind {
	pub fn collection_name(self) -> &'static str {
		match self {
			Self::Message => EMAILS_COLLECTION,
			Self::Contact => CONTACTS_COLLECTION,
			Self::Template => TEMPLATES_COLLECTION,
		}
	}
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct MessageRecord {
	pub message_id: Uuid,
	pub owner_id: String,
	pub subject: String,
	pub body: String,
	pub from_address: String,
	pub to_addresses: Vec<String>,
	pub sent_at: OffsetDateTime,
	pub folder: String,
	pub status: String,
	pub contact_id: Option<Uuid>,
	/// Free-form metadata carried by the record; only scalar entries make it
	/// into the index envelope.
	pub metadata: Value,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ContactRecord {
	pub contact_id: Uuid,
	pub owner_id: String,
	pub name: String,
	pub email: String,
	pub company: Option<String>,
	pub notes: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct TemplateRecord {
	pub template_id: Uuid,
	pub owner_id: String,
	pub name: String,
	pub body: String,
	pub updated_at: OffsetDateTime,
}
