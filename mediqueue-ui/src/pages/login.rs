//! Login Page

use leptos::*;
use leptos_router::*;

use crate::api;
use crate::state::global::GlobalState;

#[component]
pub fn Login() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let navigate = use_navigate();

    let (email, set_email) = create_signal(String::new());
    let (password, set_password) = create_signal(String::new());
    let (pending, set_pending) = create_signal(false);

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let state = state.clone();
        let navigate = navigate.clone();
        let email = email.get_untracked();
        let password = password.get_untracked();
        set_pending.set(true);

        spawn_local(async move {
            match api::login(&email, &password).await {
                Ok(response) => {
                    state.sign_in(response.token, response.user.email);
                    navigate("/dashboard", Default::default());
                }
                Err(e) => state.show_error("Login failed", &e),
            }
            set_pending.set(false);
        });
    };

    view! {
        <div class="min-h-screen flex items-center justify-center">
            <form class="bg-gray-800 rounded-xl p-8 w-full max-w-sm space-y-4" on:submit=on_submit>
                <h1 class="text-2xl font-bold text-center">"MediQueue"</h1>
                <p class="text-gray-400 text-center text-sm">"Sign in to manage hospital resources"</p>

                <input
                    type="email"
                    placeholder="Email"
                    required=true
                    class="w-full px-3 py-2 rounded-lg bg-gray-700 border border-gray-600 focus:outline-none focus:border-primary-500"
                    prop:value=email
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                />
                <input
                    type="password"
                    placeholder="Password"
                    required=true
                    class="w-full px-3 py-2 rounded-lg bg-gray-700 border border-gray-600 focus:outline-none focus:border-primary-500"
                    prop:value=password
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                />

                <button
                    type="submit"
                    class="w-full px-6 py-3 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors disabled:opacity-50"
                    disabled=move || pending.get()
                >
                    {move || if pending.get() { "Signing in..." } else { "Sign in" }}
                </button>
            </form>
        </div>
    }
}
