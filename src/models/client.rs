use crate::models::Document;

#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Client {
    pub id: i32,
    pub company_id: i32,
    pub code: String,
    pub name: String,
    pub contact_first_name: Option<String>,
    pub contact_last_name: Option<String>,
    pub address: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub archived: bool,
}

impl Client {
    /// Postal address; the country line is omitted for France.
    pub fn full_address(&self) -> String {
        let mut address = format!(
            "{}\n{}\n{} {}",
            self.name,
            self.address.as_deref().unwrap_or_default(),
            self.zip_code.as_deref().unwrap_or_default(),
            self.city.as_deref().unwrap_or_default(),
        );
        if let Some(country) = &self.country {
            if !country.eq_ignore_ascii_case("france") {
                address.push('\n');
                address.push_str(country);
            }
        }
        address
    }

    pub fn is_deletable(&self, documents: &[Document]) -> bool {
        self.archived && documents.iter().all(Document::is_deletable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(country: Option<&str>) -> Client {
        Client {
            id: 1,
            company_id: 1,
            code: "DUPT".to_string(),
            name: "Dupont & Co".to_string(),
            contact_first_name: Some("Jean".to_string()),
            contact_last_name: Some("Dupont".to_string()),
            address: Some("1 rue de la Paix".to_string()),
            zip_code: Some("75002".to_string()),
            city: Some("Paris".to_string()),
            country: country.map(str::to_string),
            email: None,
            phone: None,
            archived: false,
        }
    }

    #[test]
    fn foreign_country_is_appended_to_address() {
        assert_eq!(
            client(Some("France")).full_address(),
            "Dupont & Co\n1 rue de la Paix\n75002 Paris"
        );
        assert_eq!(
            client(Some("Belgium")).full_address(),
            "Dupont & Co\n1 rue de la Paix\n75002 Paris\nBelgium"
        );
    }

    #[test]
    fn active_client_is_not_deletable() {
        let mut c = client(None);
        assert!(!c.is_deletable(&[]));
        c.archived = true;
        assert!(c.is_deletable(&[]));
    }
}
