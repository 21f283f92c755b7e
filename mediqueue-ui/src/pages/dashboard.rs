//! Dashboard Page
//!
//! Live totals of the hospital status document.

use leptos::*;

use crate::components::{CardSkeleton, StatCard};
use crate::state::global::{DashboardMetrics, GlobalState};

const VIEW: &str = "dashboard";

/// Dashboard page component
#[component]
pub fn Dashboard() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    state.mount(VIEW);
    let state_for_cleanup = state.clone();
    on_cleanup(move || state_for_cleanup.unmount(VIEW));

    let render = state.dashboard;
    let metrics = create_memo(move |_| render.get().map(|r| r.metrics));
    let metric = move |pick: fn(&DashboardMetrics) -> i64| {
        Signal::derive(move || metrics.get().as_ref().map(pick).unwrap_or(0))
    };
    let caption = |text: &'static str| Signal::derive(move || text.to_string());

    view! {
        <div class="space-y-8">
            <div>
                <h1 class="text-3xl font-bold">"Dashboard"</h1>
                <p class="text-gray-400 mt-1">
                    {move || render.get().map(|r| r.greeting).unwrap_or_default()}
                </p>
            </div>

            {move || {
                if render.get().map_or(true, |r| r.loading) {
                    view! { <CardSkeleton /> }.into_view()
                } else {
                    view! {
                        <section class="grid grid-cols-2 md:grid-cols-4 gap-4">
                            <StatCard
                                title="Blood Units"
                                icon="🩸"
                                value=metric(|m| m.total_blood_units)
                                caption=caption("Total units across all types")
                            />
                            <StatCard
                                title="Oxygen Cylinders"
                                icon="🫁"
                                value=metric(|m| m.oxygen_cylinders)
                                caption=caption("Available cylinders")
                            />
                            <StatCard
                                title="Beds"
                                icon="🛏"
                                value=metric(|m| m.total_beds)
                                caption=Signal::derive(move || {
                                    metrics
                                        .get()
                                        .map(|m| format!("ICU: {}, General: {}", m.icu_beds, m.general_beds))
                                        .unwrap_or_default()
                                })
                            />
                            <StatCard
                                title="Doctors"
                                icon="🩺"
                                value=metric(|m| m.doctors_available)
                                caption=caption("Currently available")
                            />
                        </section>
                    }
                    .into_view()
                }
            }}

            <div class="grid md:grid-cols-2 gap-8">
                <section class="bg-gray-800 rounded-xl p-6">
                    <h2 class="text-xl font-semibold mb-4">"Blood Units by Type"</h2>
                    <BloodBreakdown metrics=metrics />
                </section>

                <section class="bg-gray-800 rounded-xl p-6">
                    <h2 class="text-xl font-semibold mb-4">"Last Updated"</h2>
                    <p class="text-gray-300">
                        {move || metrics.get().map(|m| m.last_updated).unwrap_or_else(|| "Never".to_string())}
                    </p>
                </section>
            </div>
        </div>
    }
}

#[component]
fn BloodBreakdown(metrics: Memo<Option<DashboardMetrics>>) -> impl IntoView {
    view! {
        <div class="grid grid-cols-4 gap-3">
            {move || {
                let units = metrics.get().map(|m| m.blood_units).unwrap_or_default();
                if units.is_empty() {
                    view! { <p class="col-span-4 text-gray-400 text-sm">"No blood units recorded"</p> }
                        .into_view()
                } else {
                    units
                        .into_iter()
                        .map(|entry| view! {
                            <div class="bg-gray-700 rounded px-3 py-2 text-center">
                                <div class="text-gray-400 text-xs">{entry.blood_type}</div>
                                <div class="font-semibold">{entry.units}</div>
                            </div>
                        })
                        .collect_view()
                }
            }}
        </div>
    }
}
