//! Toast Notification Component

use leptos::*;

use crate::state::global::GlobalState;

/// Toast notification container
#[component]
pub fn Toast() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    view! {
        <div class="fixed bottom-20 right-4 z-50 space-y-2">
            {move || {
                state.notification.get().map(|n| {
                    let (icon, bg_class) = if n.is_error() {
                        ("✕", "bg-red-600")
                    } else {
                        ("✓", "bg-green-600")
                    };
                    view! {
                        <div class=format!(
                            "flex items-start space-x-3 {} text-white px-4 py-3 rounded-lg shadow-lg \
                             transform transition-all duration-300 ease-out animate-slide-in",
                            bg_class
                        )>
                            <span class="text-lg">{icon}</span>
                            <div>
                                <div class="text-sm font-semibold">{n.title}</div>
                                <div class="text-sm">{n.description}</div>
                            </div>
                        </div>
                    }
                })
            }}
        </div>
    }
}
