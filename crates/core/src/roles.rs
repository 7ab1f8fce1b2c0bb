//! Well-known role name constants carried in access tokens.
//!
//! A user's role is derived from the `is_staff` column of the `users` table.

pub const ROLE_STAFF: &str = "staff";
pub const ROLE_CUSTOMER: &str = "customer";

/// Map the `is_staff` flag to the role name embedded in tokens.
pub fn role_for(is_staff: bool) -> &'static str {
    if is_staff {
        ROLE_STAFF
    } else {
        ROLE_CUSTOMER
    }
}
