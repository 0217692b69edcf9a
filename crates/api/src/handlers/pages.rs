//! Placeholder protected pages behind the request gate

pub async fn dashboard() -> &'static str {
    "Dashboard"
}

pub async fn profile() -> &'static str {
    "Profile"
}

pub async fn settings() -> &'static str {
    "Settings"
}
