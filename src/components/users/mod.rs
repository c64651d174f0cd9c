//! Users import and export.
//!
//! Import reads a CSV file in the browser, previews the parsed table and
//! uploads it with the chosen creation options; the server answers with one
//! event per processed line. Export downloads the users as CSV.

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_icons::Icon;
use wasm_bindgen::JsCast;
use web_sys::HtmlInputElement;

use crate::app::AppContext;
use crate::components::icons as ic;
use crate::core::UsersApi;
use crate::core::users::UsersTable;
use crate::models::{ExportOptions, ImportEvent, ImportOptions};
use crate::utils::dom::{download_text, read_file_text};

stylance::import_crate_style!(css, "src/components/users/users.module.css");

/// Rows shown in the import preview.
const PREVIEW_ROWS: usize = 10;

const EXPORT_FILE_NAME: &str = "users.csv";

/// A picked CSV file and its parse result.
#[derive(Clone, Debug, PartialEq)]
struct PickedFile {
    name: String,
    content: String,
    table: Result<UsersTable, String>,
}

impl PickedFile {
    fn new(name: String, content: String) -> Self {
        let table = UsersTable::from_csv(&content).map_err(|e| e.to_string());
        Self {
            name,
            content,
            table,
        }
    }
}

/// Import events that report a failure.
fn failed_events(events: &[ImportEvent]) -> usize {
    events
        .iter()
        .filter(|e| e.status.eq_ignore_ascii_case("error"))
        .count()
}

#[component]
pub fn UsersPanel() -> impl IntoView {
    view! {
        <section class=css::users>
            <h1 class=css::title>
                <Icon icon=ic::USERS />
                "Users"
            </h1>
            <ImportSection />
            <ExportSection />
        </section>
    }
}

#[component]
fn Checkbox(label: &'static str, checked: Signal<bool>, on_toggle: Callback<bool>) -> impl IntoView {
    view! {
        <label class=css::checkbox>
            <input
                type="checkbox"
                prop:checked=checked
                on:change=move |ev| on_toggle.run(event_target_checked(&ev))
            />
            {label}
        </label>
    }
}

// =============================================================================
// Import
// =============================================================================

#[component]
fn ImportSection() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");

    let picked = RwSignal::new(None::<PickedFile>);
    let options = RwSignal::new(ImportOptions::default());
    let events = RwSignal::new(Vec::<ImportEvent>::new());
    let (pending, set_pending) = signal(false);
    let (error, set_error) = signal(None::<String>);

    let on_pick = move |ev: leptos::ev::Event| {
        let file = ev
            .target()
            .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
            .and_then(|input| input.files())
            .and_then(|files| files.get(0));
        let Some(file) = file else { return };
        events.set(Vec::new());
        set_error.set(None);
        spawn_local(async move {
            match read_file_text(&file).await {
                Ok(content) => picked.set(Some(PickedFile::new(file.name(), content))),
                Err(e) => set_error.set(Some(e.to_string())),
            }
        });
    };

    let can_import = Signal::derive(move || {
        !pending.get() && picked.with(|p| p.as_ref().is_some_and(|p| p.table.is_ok()))
    });

    let on_import = move |_| {
        let Some(file) = picked.get_untracked() else { return };
        let opts = options.get_untracked();
        set_pending.set(true);
        set_error.set(None);
        spawn_local(async move {
            match ctx.api().import_users(&file.name, file.content, &opts).await {
                Ok(result) => {
                    tracing::info!(
                        events = result.len(),
                        failed = failed_events(&result),
                        "users imported"
                    );
                    events.set(result);
                }
                Err(e) => set_error.set(Some(e.to_string())),
            }
            set_pending.set(false);
        });
    };

    let option = move |read: fn(&ImportOptions) -> bool, write: fn(&mut ImportOptions, bool)| {
        (
            Signal::derive(move || options.with(read)),
            Callback::new(move |value: bool| options.update(|o| write(o, value))),
        )
    };
    let (create_user, set_create_user) = option(|o| o.create_user, |o, v| o.create_user = v);
    let (create_group, set_create_group) = option(|o| o.create_group, |o, v| o.create_group = v);
    let (create_metadata, set_create_metadata) =
        option(|o| o.create_metadata, |o, v| o.create_metadata = v);

    view! {
        <div class=css::panel>
            <h2 class=css::heading>"Import"</h2>
            <input class=css::fileInput type="file" accept=".csv,.tsv,.txt" on:change=on_pick />

            {move || picked.get().map(|file| view! { <Preview file=file /> })}

            <div class=css::options>
                <Checkbox label="Create missing users" checked=create_user on_toggle=set_create_user />
                <Checkbox label="Create missing groups" checked=create_group on_toggle=set_create_group />
                <Checkbox
                    label="Create missing metadata keys"
                    checked=create_metadata
                    on_toggle=set_create_metadata
                />
            </div>
            <button class=css::button disabled=move || !can_import.get() on:click=on_import>
                <Icon icon=ic::UPLOAD />
                {move || if pending.get() { "Importing..." } else { "Import" }}
            </button>
            {move || error.get().map(|message| view! { <div class=css::error role="alert">{message}</div> })}

            <Show when=move || events.with(|e| !e.is_empty())>
                <p class=css::summary>
                    {move || {
                        let (total, failed) = events.with(|e| (e.len(), failed_events(e)));
                        format!("{total} events, {failed} failed")
                    }}
                </p>
                <ul class=css::events>
                    {move || {
                        events
                            .get()
                            .into_iter()
                            .map(|event| {
                                let class = if event.status.eq_ignore_ascii_case("error") {
                                    format!("{} {}", css::event, css::eventError)
                                } else {
                                    css::event.to_string()
                                };
                                view! {
                                    <li class=class>
                                        <span class=css::eventStatus>{event.status}</span>
                                        {event.message}
                                    </li>
                                }
                            })
                            .collect_view()
                    }}
                </ul>
            </Show>
        </div>
    }
}

#[component]
fn Preview(file: PickedFile) -> impl IntoView {
    match file.table {
        Err(message) => view! {
            <div class=css::error role="alert">{format!("{}: {message}", file.name)}</div>
        }
        .into_any(),
        Ok(table) => {
            let header = table
                .attribute_columns
                .iter()
                .map(|column| view! { <th>{column.clone()}</th> })
                .collect_view();
            let hidden = table.rows.len().saturating_sub(PREVIEW_ROWS);
            let rows = table
                .rows
                .iter()
                .take(PREVIEW_ROWS)
                .map(|row| {
                    let cells = table
                        .attribute_columns
                        .iter()
                        .map(|column| {
                            view! { <td>{row.attributes.get(column).cloned().unwrap_or_default()}</td> }
                        })
                        .collect_view();
                    view! {
                        <tr>
                            <td>{row.user_name.clone()}</td>
                            <td>{row.groups.join(", ")}</td>
                            {cells}
                        </tr>
                    }
                })
                .collect_view();

            view! {
                <div class=css::preview>
                    <p class=css::summary>
                        {format!("{}: {} users", file.name, table.rows.len())}
                    </p>
                    <table class=css::table>
                        <thead>
                            <tr>
                                <th>"User"</th>
                                <th>"Groups"</th>
                                {header}
                            </tr>
                        </thead>
                        <tbody>{rows}</tbody>
                    </table>
                    {(hidden > 0).then(|| view! { <p class=css::summary>{format!("and {hidden} more")}</p> })}
                </div>
            }
            .into_any()
        }
    }
}

// =============================================================================
// Export
// =============================================================================

#[component]
fn ExportSection() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");

    let options = RwSignal::new(ExportOptions::default());
    let (pending, set_pending) = signal(false);
    let (error, set_error) = signal(None::<String>);

    let on_export = move |_| {
        let opts = options.get_untracked();
        set_pending.set(true);
        set_error.set(None);
        spawn_local(async move {
            let result = ctx
                .api()
                .export_users(&opts)
                .await
                .map_err(|e| e.to_string())
                .and_then(|csv| {
                    download_text(EXPORT_FILE_NAME, &csv, "text/csv").map_err(|e| e.to_string())
                });
            if let Err(message) = result {
                tracing::warn!(%message, "users export failed");
                set_error.set(Some(message));
            }
            set_pending.set(false);
        });
    };

    let option = move |read: fn(&ExportOptions) -> bool, write: fn(&mut ExportOptions, bool)| {
        (
            Signal::derive(move || options.with(read)),
            Callback::new(move |value: bool| options.update(|o| write(o, value))),
        )
    };
    let (header, set_header) = option(|o| o.include_header, |o, v| o.include_header = v);
    let (id, set_id) = option(|o| o.include_id, |o, v| o.include_id = v);
    let (name, set_name) = option(|o| o.include_user_name, |o, v| o.include_user_name = v);
    let (groups, set_groups) = option(|o| o.include_groups, |o, v| o.include_groups = v);
    let (roles, set_roles) = option(|o| o.include_roles, |o, v| o.include_roles = v);
    let (attributes, set_attributes) =
        option(|o| o.include_attributes, |o, v| o.include_attributes = v);

    view! {
        <div class=css::panel>
            <h2 class=css::heading>"Export"</h2>
            <div class=css::options>
                <Checkbox label="Header row" checked=header on_toggle=set_header />
                <Checkbox label="Identifier" checked=id on_toggle=set_id />
                <Checkbox label="User name" checked=name on_toggle=set_name />
                <Checkbox label="Groups" checked=groups on_toggle=set_groups />
                <Checkbox label="Roles" checked=roles on_toggle=set_roles />
                <Checkbox label="Attributes" checked=attributes on_toggle=set_attributes />
            </div>
            <button class=css::button disabled=pending on:click=on_export>
                <Icon icon=ic::DOWNLOAD />
                {move || if pending.get() { "Exporting..." } else { "Export CSV" }}
            </button>
            {move || error.get().map(|message| view! { <div class=css::error role="alert">{message}</div> })}
        </div>
    }
}
