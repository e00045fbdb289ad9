/// A member business of the cooperative.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Company {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
}
