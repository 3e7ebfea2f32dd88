//! Role-filtered dashboard navigation.

use serde::Serialize;

use crate::{Capability, Role};

/// A menu entry: either a direct link or a titled group of links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub title: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<NavEntry>,
}

impl NavEntry {
    fn link(title: &'static str, url: &'static str) -> Self {
        Self {
            title,
            url: Some(url),
            items: Vec::new(),
        }
    }

    fn group(title: &'static str, items: Vec<NavEntry>) -> Self {
        Self {
            title,
            url: None,
            items,
        }
    }

    /// All urls reachable from this entry, depth first.
    pub fn urls(&self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = self.url.into_iter().collect();
        for item in &self.items {
            out.extend(item.urls());
        }
        out
    }
}

/// Navigation menu offered to `role`.
pub fn navigation(role: Role) -> Vec<NavEntry> {
    let mut projects = vec![NavEntry::link("All Projects", "/dashboard/projects")];
    if role.can(Capability::CreateProject) {
        projects.push(NavEntry::link("Create Project", "/dashboard/projects/create"));
    }

    let mut nav = vec![
        NavEntry::link("Dashboard", "/dashboard"),
        NavEntry::group("Projects", projects),
        NavEntry::link("Profile", "/dashboard/profile"),
    ];

    if role.can(Capability::ManageTenant) {
        nav.push(NavEntry::group(
            "Tenant",
            vec![NavEntry::link("Manage Tenant", "/dashboard/tenant/manage")],
        ));
    }
    if role.can(Capability::ManageMembers) {
        nav.push(NavEntry::link("Members", "/dashboard/tenant/members"));
    }
    if role.can(Capability::ViewBilling) {
        nav.push(NavEntry::group(
            "Billing",
            vec![
                NavEntry::link("Subscription", "/dashboard/billing/subscription"),
                NavEntry::link("Invoices", "/dashboard/billing/invoices"),
            ],
        ));
    }

    nav
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_urls(role: Role) -> Vec<&'static str> {
        navigation(role).iter().flat_map(NavEntry::urls).collect()
    }

    #[test]
    fn member_sees_projects_and_profile_only() {
        let urls = all_urls(Role::Member);
        assert_eq!(
            urls,
            vec!["/dashboard", "/dashboard/projects", "/dashboard/profile"]
        );
    }

    #[test]
    fn admin_gets_members_and_billing_but_not_tenant() {
        let urls = all_urls(Role::Admin);
        assert!(urls.contains(&"/dashboard/projects/create"));
        assert!(urls.contains(&"/dashboard/tenant/members"));
        assert!(urls.contains(&"/dashboard/billing/invoices"));
        assert!(!urls.contains(&"/dashboard/tenant/manage"));
    }

    #[test]
    fn owner_gets_everything() {
        let nav = navigation(Role::Owner);
        let titles: Vec<_> = nav.iter().map(|e| e.title).collect();
        assert_eq!(
            titles,
            vec!["Dashboard", "Projects", "Profile", "Tenant", "Members", "Billing"]
        );
    }
}
