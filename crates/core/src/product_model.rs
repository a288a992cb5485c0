//! Product models (mã hàng): reusable BOM templates with an improvement log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::order::Bom;
use crate::types::{Gender, ModelId};

/// Reason recorded for a BOM change submitted without one.
pub const DEFAULT_BOM_CHANGE_REASON: &str = "Cập nhật BOM";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditLogKind {
    BomChange,
    IssueFix,
}

/// One entry of a model's improvement history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelEditLog {
    pub date: DateTime<Utc>,
    pub reason: String,
    #[serde(rename = "type")]
    pub kind: EditLogKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
}

/// Log entry submitted together with a model update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditNote {
    #[serde(rename_all = "camelCase")]
    BomChange {
        #[serde(default)]
        reason: String,
    },
    #[serde(rename_all = "camelCase")]
    IssueFix {
        customer_name: String,
        #[serde(default)]
        issue_description: String,
        #[serde(default)]
        solution: String,
    },
}

impl EditNote {
    /// The log entry this note produces, or `None` when every field is blank.
    #[must_use]
    pub fn into_log(self, now: DateTime<Utc>) -> Option<ModelEditLog> {
        match self {
            Self::BomChange { reason } => {
                let reason = reason.trim();
                Some(ModelEditLog {
                    date: now,
                    reason: if reason.is_empty() {
                        DEFAULT_BOM_CHANGE_REASON.to_owned()
                    } else {
                        reason.to_owned()
                    },
                    kind: EditLogKind::BomChange,
                    customer_name: None,
                    issue_description: None,
                    solution: None,
                })
            }
            Self::IssueFix {
                customer_name,
                issue_description,
                solution,
            } => {
                if customer_name.trim().is_empty()
                    && issue_description.trim().is_empty()
                    && solution.trim().is_empty()
                {
                    return None;
                }
                Some(ModelEditLog {
                    date: now,
                    reason: format!("Sửa lỗi khách {customer_name}"),
                    kind: EditLogKind::IssueFix,
                    customer_name: Some(customer_name),
                    issue_description: Some(issue_description),
                    solution: Some(solution),
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductModel {
    pub id: ModelId,
    pub item_code: String,
    #[serde(default)]
    pub product_image: String,
    #[serde(default)]
    pub bom: Bom,
    pub gender: Gender,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Newest first.
    #[serde(default)]
    pub edit_history: Vec<ModelEditLog>,
    #[serde(default)]
    pub is_archived: bool,
    /// Rich-text technical document, stored as HTML.
    #[serde(default)]
    pub technical_document: String,
}

/// Submitted fields for creating or editing a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelForm {
    pub item_code: String,
    #[serde(default)]
    pub product_image: String,
    #[serde(default)]
    pub bom: Bom,
    pub gender: Gender,
    #[serde(default)]
    pub technical_document: String,
    /// Ignored on create.
    #[serde(default)]
    pub edit_note: Option<EditNote>,
}

impl ModelForm {
    /// Build a new, unarchived model with an empty history.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MissingField`] if the item code is blank.
    pub fn into_model(self, now: DateTime<Utc>) -> Result<ProductModel, DomainError> {
        if self.item_code.trim().is_empty() {
            return Err(DomainError::MissingField("itemCode"));
        }
        Ok(ProductModel {
            id: ModelId::generate(),
            item_code: self.item_code,
            product_image: self.product_image,
            bom: self.bom,
            gender: self.gender,
            created_at: now,
            updated_at: None,
            edit_history: Vec::new(),
            is_archived: false,
            technical_document: self.technical_document,
        })
    }

    /// Update `model`, prepending a log entry when a note was given.
    ///
    /// Earlier log entries are never rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MissingField`] if the item code is blank.
    pub fn apply_to(self, model: &mut ProductModel, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.item_code.trim().is_empty() {
            return Err(DomainError::MissingField("itemCode"));
        }
        model.item_code = self.item_code;
        model.product_image = self.product_image;
        model.bom = self.bom;
        model.gender = self.gender;
        model.technical_document = self.technical_document;
        model.updated_at = Some(now);
        if let Some(log) = self.edit_note.and_then(|note| note.into_log(now)) {
            model.edit_history.insert(0, log);
        }
        Ok(())
    }
}

/// Case-insensitive search on item code.
pub fn search<'a>(
    models: &'a [ProductModel],
    term: &'a str,
) -> impl Iterator<Item = &'a ProductModel> + 'a {
    let term = term.to_lowercase();
    models
        .iter()
        .filter(move |m| m.item_code.to_lowercase().contains(&term))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn form(note: Option<EditNote>) -> ModelForm {
        ModelForm {
            item_code: "B0137".into(),
            product_image: String::new(),
            bom: Bom::default(),
            gender: Gender::Female,
            technical_document: String::new(),
            edit_note: note,
        }
    }

    #[test]
    fn test_update_without_note_keeps_history() {
        let now = Utc::now();
        let mut model = form(None).into_model(now).unwrap();
        form(None).apply_to(&mut model, now).unwrap();
        assert!(model.edit_history.is_empty());
        assert_eq!(model.updated_at, Some(now));
    }

    #[test]
    fn test_bom_change_defaults_reason_and_prepends() {
        let now = Utc::now();
        let mut model = form(None).into_model(now).unwrap();
        form(Some(EditNote::BomChange {
            reason: "Đổi đế".into(),
        }))
        .apply_to(&mut model, now)
        .unwrap();
        let first = model.edit_history[0].clone();

        form(Some(EditNote::BomChange {
            reason: String::new(),
        }))
        .apply_to(&mut model, now)
        .unwrap();

        assert_eq!(model.edit_history.len(), 2);
        assert_eq!(model.edit_history[0].reason, DEFAULT_BOM_CHANGE_REASON);
        assert_eq!(model.edit_history[1], first);
    }

    #[test]
    fn test_issue_fix_reason_names_customer() {
        let log = EditNote::IssueFix {
            customer_name: "LA CAMIE".into(),
            issue_description: "Bong keo".into(),
            solution: "Đổi keo".into(),
        }
        .into_log(Utc::now())
        .unwrap();
        assert_eq!(log.reason, "Sửa lỗi khách LA CAMIE");
        assert_eq!(log.kind, EditLogKind::IssueFix);
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["type"], "ISSUE_FIX");
        assert_eq!(json["issueDescription"], "Bong keo");
    }

    #[test]
    fn test_blank_issue_fix_adds_nothing() {
        let note = EditNote::IssueFix {
            customer_name: String::new(),
            issue_description: String::new(),
            solution: String::new(),
        };
        assert!(note.into_log(Utc::now()).is_none());
    }

    #[test]
    fn test_edit_note_wire_format() {
        let note: EditNote =
            serde_json::from_str(r#"{"type": "ISSUE_FIX", "customerName": "A"}"#).unwrap();
        assert!(matches!(note, EditNote::IssueFix { .. }));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let now = Utc::now();
        let models = vec![form(None).into_model(now).unwrap()];
        assert_eq!(search(&models, "b01").count(), 1);
        assert_eq!(search(&models, "x").count(), 0);
    }
}
