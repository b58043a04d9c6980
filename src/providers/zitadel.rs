//! zitadel/zitadel

use serde::Serialize;
use stackgraph::{Provider, Resource};

#[derive(Debug, Clone, Serialize)]
pub struct ZitadelProvider {
    pub domain: String,
    /// Service-account key as a compact JSON string
    pub jwt_profile_json: String,
}

impl Provider for ZitadelProvider {
    const NAME: &'static str = "zitadel";
    const SOURCE: &'static str = "zitadel/zitadel";
    const VERSION: &'static str = "~> 2.0";
}

#[derive(Debug, Clone, Serialize)]
pub struct Org {
    pub name: String,
}

impl Resource for Org {
    const TYPE: &'static str = "zitadel_org";
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub name: String,
    pub org_id: String,
}

impl Resource for Project {
    const TYPE: &'static str = "zitadel_project";
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationOidc {
    pub name: String,
    pub project_id: String,
    pub org_id: String,
    pub grant_types: Vec<String>,
    pub redirect_uris: Vec<String>,
    pub response_types: Vec<String>,
}

impl Resource for ApplicationOidc {
    const TYPE: &'static str = "zitadel_application_oidc";
}

#[derive(Debug, Clone, Serialize)]
pub struct HumanUser {
    pub user_name: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub org_id: String,
    pub initial_password: String,
    pub is_email_verified: bool,
}

impl Resource for HumanUser {
    const TYPE: &'static str = "zitadel_human_user";
}
