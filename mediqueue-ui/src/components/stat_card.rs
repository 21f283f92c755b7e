//! Stat Card Component
//!
//! One dashboard total with a caption.

use leptos::*;

#[component]
pub fn StatCard(
    #[prop(into)]
    title: String,
    #[prop(into)]
    value: Signal<i64>,
    /// Caption under the value
    #[prop(into)]
    caption: Signal<String>,
    icon: &'static str,
) -> impl IntoView {
    view! {
        <div class="bg-gray-800 rounded-lg p-4 border border-gray-700">
            <div class="flex items-center justify-between">
                <span class="text-gray-400 text-sm">{title}</span>
                <span class="text-xl">{icon}</span>
            </div>
            <div class="text-3xl font-bold mt-2">{move || value.get()}</div>
            <div class="text-sm text-gray-500 mt-2">{move || caption.get()}</div>
        </div>
    }
}
