/// Validate an email used as a login identifier.
///
/// Deliberately loose: one `@` with something on both sides and no whitespace.
pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters".to_string());
    }

    if email.chars().any(char::is_whitespace) {
        return Err("Email cannot contain whitespace".to_string());
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => Ok(()),
        _ => Err("Email must look like name@domain".to_string()),
    }
}

/// Validate username format and requirements
pub fn validate_username_format(username: &str) -> Result<(), String> {
    if username.len() < 3 {
        return Err("Username must be at least 3 characters".to_string());
    }

    if username.len() > 50 {
        return Err("Username must be less than 50 characters".to_string());
    }

    // Allow alphanumeric, underscore, hyphen, dot
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err("Username can only contain letters, numbers, underscore, hyphen and dot".to_string());
    }

    Ok(())
}

/// Passwords only need to be present and of bounded size; bcrypt ignores
/// everything past 72 bytes.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password cannot be empty".to_string());
    }
    if password.len() > 72 {
        return Err("Password must be at most 72 bytes".to_string());
    }
    Ok(())
}
