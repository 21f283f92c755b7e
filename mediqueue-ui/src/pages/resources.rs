//! Resources Page
//!
//! Form over the hospital status document. Every keystroke is sent to the
//! server-side form; the server pushes the coerced values back.

use leptos::*;

use crate::components::Loading;
use crate::state::global::GlobalState;
use crate::state::websocket::ClientMessage;

const VIEW: &str = "resources";

const BLOOD_TYPES: [&str; 8] = ["A+", "A-", "B+", "B-", "O+", "O-", "AB+", "AB-"];

#[component]
pub fn Resources() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    state.mount(VIEW);
    let state_for_cleanup = state.clone();
    on_cleanup(move || state_for_cleanup.unmount(VIEW));

    let render = state.resources;
    let submitting = Signal::derive(move || render.get().map_or(false, |r| r.submitting));

    let on_submit = {
        let state = state.clone();
        move |ev: ev::SubmitEvent| {
            ev.prevent_default();
            state.send(ClientMessage::Submit);
        }
    };

    view! {
        <div class="space-y-8">
            <div>
                <h1 class="text-3xl font-bold">"Resources"</h1>
                <p class="text-gray-400 mt-1">"Update hospital resource counts"</p>
            </div>

            {move || {
                if render.get().is_none() {
                    view! { <Loading /> }.into_view()
                } else {
                    view! {}.into_view()
                }
            }}

            <form class="space-y-8" on:submit=on_submit>
                <section class="bg-gray-800 rounded-xl p-6">
                    <h2 class="text-xl font-semibold mb-4">"Blood Units"</h2>
                    <div class="grid grid-cols-2 md:grid-cols-4 gap-4">
                        {BLOOD_TYPES
                            .iter()
                            .map(|t| view! { <CountInput label=*t field=format!("bloodUnits.{}", t) /> })
                            .collect_view()}
                    </div>
                </section>

                <section class="bg-gray-800 rounded-xl p-6">
                    <h2 class="text-xl font-semibold mb-4">"Equipment and Staff"</h2>
                    <div class="grid grid-cols-2 md:grid-cols-4 gap-4">
                        <CountInput label="Oxygen Cylinders" field="oxygenCylinders".to_string() />
                        <CountInput label="ICU Beds" field="icuBeds".to_string() />
                        <CountInput label="General Beds" field="generalBeds".to_string() />
                        <CountInput label="Doctors Available" field="doctorsAvailable".to_string() />
                    </div>
                </section>

                <button
                    type="submit"
                    class="px-6 py-3 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors disabled:opacity-50"
                    disabled=move || submitting.get()
                >
                    {move || if submitting.get() { "Updating..." } else { "Update Resources" }}
                </button>
            </form>
        </div>
    }
}

/// Numeric input bound to one form field path
#[component]
fn CountInput(label: &'static str, field: String) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let render = state.resources;
    let field_for_value = field.clone();

    let value = move || {
        render
            .get()
            .map(|r| r.form.value(&field_for_value))
            .unwrap_or(0)
            .to_string()
    };

    view! {
        <label class="block">
            <span class="text-gray-400 text-sm">{label}</span>
            <input
                type="number"
                min="0"
                placeholder="0"
                class="mt-1 w-full px-3 py-2 rounded-lg bg-gray-700 border border-gray-600 focus:outline-none focus:border-primary-500"
                prop:value=value
                on:input=move |ev| {
                    state.send(ClientMessage::Edit {
                        field: field.clone(),
                        value: event_target_value(&ev),
                    });
                }
            />
        </label>
    }
}
