//! App Root Component
//!
//! Main application component with routing and global providers.

use leptos::*;
use leptos_router::*;

use crate::components::{Sidebar, Toast};
use crate::pages::{Dashboard, Login, Resources};
use crate::state::global::{provide_global_state, GlobalState};

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    provide_global_state();

    // Resume a remembered session
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    if let Some(token) = state.token.get_untracked() {
        state.connect(&token);
    }

    view! {
        <Router>
            <div class="min-h-screen bg-gray-900 text-white">
                <Routes>
                    <Route path="/login" view=Login />
                    <Route path="" view=Shell>
                        <Route path="/" view=|| view! { <Redirect path="/dashboard" /> } />
                        <Route path="/dashboard" view=Dashboard />
                        <Route path="/resources" view=Resources />
                        <Route path="/*any" view=NotFound />
                    </Route>
                </Routes>

                <Toast />
            </div>
        </Router>
    }
}

/// Authenticated layout: sidebar, page and connection footer
#[component]
fn Shell() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    move || {
        if state.is_logged_in() {
            view! {
                <div class="flex min-h-screen">
                    <Sidebar />
                    <main class="flex-1 container mx-auto px-4 py-8 pb-24">
                        <Outlet />
                    </main>
                    <Footer />
                </div>
            }
            .into_view()
        } else {
            view! { <Redirect path="/login" /> }.into_view()
        }
    }
}

/// Footer component showing connection status
#[component]
fn Footer() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    view! {
        <footer class="fixed bottom-0 left-64 right-0 bg-gray-800 border-t border-gray-700 py-3 px-4">
            <div class="flex items-center justify-between text-sm">
                {move || {
                    if state.ws_connected.get() {
                        view! {
                            <span class="flex items-center space-x-1 text-green-400">
                                <span class="w-2 h-2 bg-green-400 rounded-full pulse" />
                                <span>"Live"</span>
                            </span>
                        }.into_view()
                    } else {
                        view! {
                            <span class="flex items-center space-x-1 text-red-400">
                                <span class="w-2 h-2 bg-red-400 rounded-full" />
                                <span>"Disconnected"</span>
                            </span>
                        }.into_view()
                    }
                }}

                <span class="text-gray-400">
                    {move || state.user.get().unwrap_or_default()}
                </span>
            </div>
        </footer>
    }
}

/// 404 Not Found page
#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="flex flex-col items-center justify-center min-h-[60vh] text-center">
            <h1 class="text-3xl font-bold mb-2">"Page Not Found"</h1>
            <p class="text-gray-400 mb-6">"The page you're looking for doesn't exist."</p>
            <A
                href="/dashboard"
                class="px-6 py-3 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors"
            >
                "Go to Dashboard"
            </A>
        </div>
    }
}
