use chrono::NaiveDate;
use pes_gateway_shared::types::{Contact, Engagement, Organization};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::errors::SerializationError;
use crate::serializer::{
    dedup_keep_order, lenient_date, lenient_string, present, required, serialize_contact,
    ContactDocument, Document,
};
use crate::translations::{ExportTranslations, Translations};

document_fields! {
    /// Selectable fields of an organization document.
    OrganizationField {
        Title => "title",
        Description => "description",
        Acronym => "acronym",
        Testimony => "testimony",
        AnnualRevenue => "annual_revenue",
        Workforce => "workforce",
        LegalStatus => "legal_status",
        Birth => "birth",
        Web => "web",
        Contacts => "contacts",
        Members => "members",
        PrefPhone => "pref_phone",
        PrefEmail => "pref_email",
        TransverseThemes => "transverse_themes",
    }
}

/// An organization together with the rows serialized alongside it.
#[derive(Debug, Clone, Copy)]
pub struct OrganizationView<'a> {
    pub organization: &'a Organization,
    pub contacts: &'a [Contact],
    pub engagements: &'a [Engagement],
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberDocument {
    pub person: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub role_detail: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationDocument {
    pub uuid: String,
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub acronym: Option<String>,
    #[serde(default)]
    pub testimony: Option<String>,
    #[serde(default)]
    pub annual_revenue: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub workforce: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub birth: Option<NaiveDate>,
    #[serde(default)]
    pub web: Option<String>,
    #[serde(default)]
    pub legal_status: Option<String>,
    #[serde(default)]
    pub pref_email: Option<String>,
    #[serde(default)]
    pub pref_phone: Option<String>,
    #[serde(default)]
    pub contacts: Option<Vec<ContactDocument>>,
    #[serde(default)]
    pub members: Option<Vec<MemberDocument>>,
    #[serde(default)]
    pub transverse_themes: Option<Vec<i64>>,
}

pub fn serialize_organization(
    view: &OrganizationView<'_>,
    fields: &[OrganizationField],
    translations: &ExportTranslations,
) -> Result<Document, SerializationError> {
    let organization = view.organization;
    let mut document = Document::new();
    document.insert("uuid".to_string(), json!(organization.uuid));

    for field in fields {
        let value = match field {
            OrganizationField::Title => json!(organization.title),
            OrganizationField::Description => json!(organization.description),
            OrganizationField::Acronym => json!(organization.acronym),
            OrganizationField::Testimony => json!(organization.testimony),
            OrganizationField::AnnualRevenue => json!(organization.annual_revenue),
            OrganizationField::Workforce => json!(organization.workforce),
            OrganizationField::LegalStatus => json!(organization
                .legal_status
                .as_deref()
                .and_then(|slug| translations.legal_status(slug))),
            OrganizationField::Birth => json!(organization.birth),
            OrganizationField::Web => json!(organization.web),
            OrganizationField::Contacts => {
                Value::Array(view.contacts.iter().map(serialize_contact).collect())
            }
            OrganizationField::Members => serialize_members(view.engagements, translations)?,
            OrganizationField::PrefPhone => json!(organization.pref_phone),
            OrganizationField::PrefEmail => json!(organization.pref_email),
            OrganizationField::TransverseThemes => json!(organization.transverse_themes),
        };
        document.insert(field.as_str().to_string(), value);
    }
    Ok(document)
}

fn serialize_members(
    engagements: &[Engagement],
    translations: &ExportTranslations,
) -> Result<Value, SerializationError> {
    let members = engagements
        .iter()
        .map(|engagement| {
            let role = engagement
                .role
                .as_deref()
                .map(|local| {
                    translations
                        .role(local)
                        .ok_or_else(|| SerializationError::UntranslatableRole(local.to_string()))
                })
                .transpose()?;
            Ok(json!({
                "person": engagement.person,
                "role": role,
                "role_detail": engagement.role_detail,
            }))
        })
        .collect::<Result<Vec<_>, SerializationError>>()?;
    Ok(Value::Array(members))
}

/// Maps a document onto `organization`.
///
/// The legal status and transverse themes go through `translations`;
/// untranslatable values are dropped with a warning. Preferred contacts are
/// copied as given and left for the caller to resolve.
pub fn deserialize_organization(
    organization: &mut Organization,
    document: &OrganizationDocument,
    translations: &Translations,
) -> Result<(), SerializationError> {
    organization.uuid = document.uuid.clone();
    organization.title = required(&document.title, "title")?;
    organization.description = document.description.clone();
    organization.acronym = document.acronym.clone();
    organization.testimony = document.testimony.clone().unwrap_or_default();
    organization.annual_revenue = document.annual_revenue;
    organization.workforce = document.workforce.clone();
    organization.birth = document.birth;
    organization.web = document.web.clone();
    organization.pref_email = document.pref_email.clone();
    organization.pref_phone = document.pref_phone.clone();

    organization.legal_status = document.legal_status.as_deref().and_then(|remote| {
        let local = translations.legal_status(remote);
        if local.is_none() {
            warn!(
                key = %document.uuid,
                legal_status = remote,
                "Unknown legal status, leaving it empty"
            );
        }
        local.map(str::to_string)
    });

    let themes: Vec<i64> = document
        .transverse_themes
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|remote| {
            let local = translations.transverse_theme(*remote);
            if local.is_none() {
                warn!(
                    key = %document.uuid,
                    transverse_theme = remote,
                    "Unknown transverse theme, dropping it"
                );
            }
            local
        })
        .collect();
    organization.transverse_themes = dedup_keep_order(&themes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::parse_document;
    use pes_gateway_shared::types::OwnerRef;

    fn translations() -> Translations {
        let mut translations = Translations::new();
        translations.insert_legal_status("asso", "association-1901");
        translations.insert_transverse_theme(7, 1);
        translations
    }

    #[test]
    fn test_uuid_is_always_present() {
        let organization = Organization::new("o-1", "Coop");
        let view = OrganizationView {
            organization: &organization,
            contacts: &[],
            engagements: &[],
        };

        let document = serialize_organization(&view, &[], &ExportTranslations::new()).unwrap();

        assert_eq!(Value::Object(document), json!({"uuid": "o-1"}));
    }

    #[test]
    fn test_only_requested_fields_are_serialized() {
        let mut organization = Organization::new("o-1", "Coop");
        organization.acronym = Some("CP".into());
        let view = OrganizationView {
            organization: &organization,
            contacts: &[],
            engagements: &[],
        };

        let document = serialize_organization(
            &view,
            &[OrganizationField::Title, OrganizationField::Acronym],
            &ExportTranslations::new(),
        )
        .unwrap();

        assert_eq!(
            Value::Object(document),
            json!({"uuid": "o-1", "title": "Coop", "acronym": "CP"})
        );
    }

    #[test]
    fn test_references_are_serialized_as_remote_identifiers() {
        let mut organization = Organization::new("o-1", "Coop");
        organization.legal_status = Some("association-1901".into());
        organization.pref_email = Some("c-1".into());
        organization.transverse_themes = vec![1, 4];
        let contacts = [Contact {
            uuid: "c-1".into(),
            content: "coop@example.org".into(),
            contact_medium: Some(2),
            owner: OwnerRef::organization("o-1"),
        }];
        let engagements = [Engagement {
            organization: "o-1".into(),
            person: "p-1".into(),
            role: Some("local-president".into()),
            role_detail: Some("founder".into()),
        }];
        let mut export = ExportTranslations::new();
        export.insert_role("local-president", "remote-president");
        export.insert_legal_status("association-1901", "asso");
        let view = OrganizationView {
            organization: &organization,
            contacts: &contacts,
            engagements: &engagements,
        };

        let document = serialize_organization(&view, OrganizationField::ALL, &export).unwrap();

        assert_eq!(document["legal_status"], json!("asso"));
        assert_eq!(document["pref_email"], json!("c-1"));
        assert_eq!(document["transverse_themes"], json!([1, 4]));
        assert_eq!(
            document["contacts"],
            json!([{"uuid": "c-1", "content": "coop@example.org", "contact_medium": 2}])
        );
        assert_eq!(
            document["members"],
            json!([{"person": "p-1", "role": "remote-president", "role_detail": "founder"}])
        );
    }

    #[test]
    fn test_untranslatable_member_role_is_an_error() {
        let organization = Organization::new("o-1", "Coop");
        let engagements = [Engagement {
            organization: "o-1".into(),
            person: "p-1".into(),
            role: Some("local-only".into()),
            role_detail: None,
        }];
        let view = OrganizationView {
            organization: &organization,
            contacts: &[],
            engagements: &engagements,
        };

        let result = serialize_organization(
            &view,
            &[OrganizationField::Members],
            &ExportTranslations::new(),
        );

        assert!(matches!(result, Err(SerializationError::UntranslatableRole(_))));
    }

    #[test]
    fn test_absent_fields_reset_to_defaults() {
        let mut organization = Organization::new("o-1", "Old title");
        organization.acronym = Some("OT".into());
        organization.testimony = "We did it".into();
        organization.transverse_themes = vec![1];
        let document: OrganizationDocument =
            parse_document(&json!({"uuid": "o-1", "title": "New title"})).unwrap();

        deserialize_organization(&mut organization, &document, &translations()).unwrap();

        assert_eq!(organization, Organization::new("o-1", "New title"));
    }

    #[test]
    fn test_lookups_are_translated_and_unknown_themes_dropped() {
        let mut organization = Organization::default();
        let document: OrganizationDocument = parse_document(&json!({
            "uuid": "o-1",
            "title": "Coop",
            "legal_status": "asso",
            "transverse_themes": [7, 99, 7],
            "birth": "2001-09-01",
        }))
        .unwrap();

        deserialize_organization(&mut organization, &document, &translations()).unwrap();

        assert_eq!(organization.legal_status.as_deref(), Some("association-1901"));
        assert_eq!(organization.transverse_themes, vec![1]);
        assert_eq!(organization.birth, NaiveDate::from_ymd_opt(2001, 9, 1));
    }

    #[test]
    fn test_null_title_is_rejected() {
        let mut organization = Organization::default();
        let document: OrganizationDocument =
            parse_document(&json!({"uuid": "o-1", "title": null})).unwrap();

        let result = deserialize_organization(&mut organization, &document, &translations());

        assert!(matches!(result, Err(SerializationError::NullField("title"))));
    }
}
