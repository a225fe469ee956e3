/// One entry of the site's top navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub page: &'static str,
}

pub const HOME_PAGE: &str = "app.py";

pub const NAV_ITEMS: &[NavItem] = &[
    NavItem { label: "Home", page: HOME_PAGE },
    NavItem { label: "RSV Basics", page: "pages/1_RSV_Basics.py" },
    NavItem { label: "Symptoms", page: "pages/2_Symptoms.py" },
    NavItem { label: "Eligibility", page: "pages/3_Eligibility.py" },
    NavItem { label: "Vaccination", page: "pages/4_Vaccination.py" },
    NavItem { label: "Prevention", page: "pages/5_Prevention.py" },
    NavItem { label: "Appointments", page: "pages/6_Appointments.py" },
    NavItem { label: "Get Support", page: "pages/7_Get_Support.py" },
];

/// Finds a page by path or by label (case-insensitive).
pub fn resolve_page(query: &str) -> Option<&'static NavItem> {
    let query = query.trim();
    NAV_ITEMS
        .iter()
        .find(|item| item.page == query || item.label.eq_ignore_ascii_case(query))
}
