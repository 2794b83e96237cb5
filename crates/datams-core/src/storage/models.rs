/// A row of the `file` table as seen by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: i64,
    pub path: String,
}

/// Login account. `role` 0 is an administrator, 1 a standard user.
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: i64,
    pub password_expired: bool,
}
