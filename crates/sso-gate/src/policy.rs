//! Per-endpoint access policy.
//!
//! Policies are declared statically when routes are registered. Controller
//! (router) level declarations are folded first and endpoint level
//! declarations second, so the most specific `AllowAnonymous`/`Authorize`
//! wins while role lists from both levels accumulate.

use std::collections::BTreeSet;

/// A single authorization declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAttribute {
    /// Endpoint is public.
    AllowAnonymous,
    /// Endpoint requires a session; `roles` is a comma-separated list.
    Authorize { roles: Option<String> },
}

impl AuthAttribute {
    /// `Authorize` without role restriction.
    pub fn authorize() -> Self {
        AuthAttribute::Authorize { roles: None }
    }

    /// `Authorize` restricted to a comma-separated role list.
    pub fn roles(roles: &str) -> Self {
        AuthAttribute::Authorize {
            roles: Some(roles.to_string()),
        }
    }
}

/// Resolved access requirements for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    /// Whether a verified session is needed at all.
    pub requires_auth: bool,
    /// Roles of which the principal must hold at least one; empty means any
    /// authenticated principal.
    pub required_roles: BTreeSet<String>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::authenticated()
    }
}

impl AccessPolicy {
    /// Any authenticated principal.
    pub fn authenticated() -> Self {
        Self {
            requires_auth: true,
            required_roles: BTreeSet::new(),
        }
    }

    /// No authentication.
    pub fn anonymous() -> Self {
        Self {
            requires_auth: false,
            required_roles: BTreeSet::new(),
        }
    }

    /// Authenticated principal holding one of a comma-separated list of roles.
    pub fn with_roles(roles: &str) -> Self {
        Self {
            requires_auth: true,
            required_roles: split_roles(roles).collect(),
        }
    }

    /// Fold controller-level then endpoint-level declarations.
    ///
    /// Authentication is required unless the last `AllowAnonymous`/`Authorize`
    /// seen is `AllowAnonymous`. Roles from every `Authorize` are merged.
    pub fn from_declarations(controller: &[AuthAttribute], endpoint: &[AuthAttribute]) -> Self {
        let mut policy = Self::authenticated();

        for attribute in controller.iter().chain(endpoint) {
            match attribute {
                AuthAttribute::AllowAnonymous => policy.requires_auth = false,
                AuthAttribute::Authorize { roles } => {
                    policy.requires_auth = true;
                    if let Some(roles) = roles {
                        policy.required_roles.extend(split_roles(roles));
                    }
                }
            }
        }

        policy
    }

    /// Whether `granted` satisfies the role requirement.
    ///
    /// True when no roles are required, otherwise iff the sets intersect.
    pub fn roles_satisfied<'a, I>(&self, granted: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        if self.required_roles.is_empty() {
            return true;
        }
        granted
            .into_iter()
            .any(|role| self.required_roles.contains(role))
    }
}

fn split_roles(roles: &str) -> impl Iterator<Item = String> + '_ {
    roles
        .split(',')
        .filter(|role| !role.is_empty())
        .map(ToString::to_string)
}
