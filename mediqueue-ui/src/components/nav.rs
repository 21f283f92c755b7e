//! Navigation Component
//!
//! Sidebar with brand, links and logout.

use leptos::*;
use leptos_router::*;

use crate::api;
use crate::state::global::GlobalState;

pub const BRAND: &str = "MediQueue";

/// A sidebar entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub href: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

/// Sidebar entries in display order
pub const NAV_ITEMS: [NavItem; 2] = [
    NavItem {
        href: "/dashboard",
        label: "Dashboard",
        icon: "activity",
    },
    NavItem {
        href: "/resources",
        label: "Resources",
        icon: "bell",
    },
];

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Whether a link is active: exact match after trimming trailing slashes
pub fn is_active(href: &str, current_path: &str) -> bool {
    normalize(href) == normalize(current_path)
}

fn icon_glyph(icon: &str) -> &'static str {
    match icon {
        "activity" => "📈",
        "bell" => "🔔",
        _ => "•",
    }
}

/// Sidebar navigation component
#[component]
pub fn Sidebar() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let navigate = use_navigate();
    let (logging_out, set_logging_out) = create_signal(false);

    let on_logout = move |_| {
        let Some(token) = state.token.get_untracked() else {
            return;
        };
        let state = state.clone();
        let navigate = navigate.clone();
        set_logging_out.set(true);
        spawn_local(async move {
            let outcome = api::logout(&token).await;
            set_logging_out.set(false);
            state.notify(outcome.notification);
            if let Some(path) = outcome.redirect {
                state.sign_out();
                navigate(&path, Default::default());
            }
        });
    };

    view! {
        <aside class="w-64 bg-gray-800 border-r border-gray-700 flex flex-col">
            <div class="h-16 flex items-center px-6 border-b border-gray-700">
                <span class="text-xl font-bold text-white">{BRAND}</span>
            </div>

            <nav class="flex-1 px-3 py-4 space-y-1">
                {NAV_ITEMS
                    .iter()
                    .map(|item| view! { <NavLink item=*item /> })
                    .collect_view()}
            </nav>

            <div class="px-3 py-4 border-t border-gray-700">
                <button
                    class="w-full px-4 py-2 rounded-lg text-gray-300 hover:text-white hover:bg-gray-700 transition-colors text-left disabled:opacity-50"
                    disabled=move || logging_out.get()
                    on:click=on_logout
                >
                    "Logout"
                </button>
            </div>
        </aside>
    }
}

/// Individual navigation link, highlighted on an exact path match
#[component]
fn NavLink(item: NavItem) -> impl IntoView {
    let location = use_location();
    let active = move || is_active(item.href, &location.pathname.get());

    view! {
        <A href=item.href class="block">
            <div class=move || {
                let state = if active() {
                    "bg-gray-700 text-white"
                } else {
                    "text-gray-300 hover:text-white hover:bg-gray-700"
                };
                format!("flex items-center space-x-3 px-4 py-2 rounded-lg transition-colors {}", state)
            }>
                <span>{icon_glyph(item.icon)}</span>
                <span>{item.label}</span>
            </div>
        </A>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(path: &str) -> Vec<&'static str> {
        NAV_ITEMS
            .iter()
            .filter(|item| is_active(item.href, path))
            .map(|item| item.label)
            .collect()
    }

    #[test]
    fn test_active_link() {
        assert_eq!(active("/dashboard"), vec!["Dashboard"]);
        assert_eq!(active("/resources"), vec!["Resources"]);
        assert_eq!(active("/resources/"), vec!["Resources"]);
        assert!(active("/login").is_empty());
        assert!(active("/").is_empty());
        assert!(active("/dashboard/extra").is_empty());
    }

    #[test]
    fn test_nav_items_have_glyphs() {
        assert_eq!(NAV_ITEMS[0].href, "/dashboard");
        assert_eq!(NAV_ITEMS[1].href, "/resources");
        for item in NAV_ITEMS {
            assert_ne!(icon_glyph(item.icon), "•");
        }
    }
}
