//! Loading Component
//!
//! Loading spinners and skeleton states.

use leptos::*;

/// Full-page loading spinner
#[component]
pub fn Loading() -> impl IntoView {
    view! {
        <div class="flex items-center justify-center py-12">
            <div class="loading-spinner w-8 h-8" />
        </div>
    }
}

/// Skeleton loader for cards
#[component]
pub fn CardSkeleton(
    #[prop(default = 4)]
    count: usize,
) -> impl IntoView {
    view! {
        <div class="grid grid-cols-2 md:grid-cols-4 gap-4">
            {(0..count).map(|_| view! {
                <div class="bg-gray-800 rounded-lg p-4 animate-pulse">
                    <div class="h-4 bg-gray-700 rounded w-1/3 mb-4" />
                    <div class="h-8 bg-gray-700 rounded w-1/2 mb-2" />
                    <div class="h-4 bg-gray-700 rounded w-2/3" />
                </div>
            }).collect_view()}
        </div>
    }
}
