//! Object metadata: editable tags and a text preview.

use leptos::prelude::*;
use leptos_icons::Icon;

use crate::app::AppContext;
use crate::components::icons as ic;
use crate::core::validation::tags_from_rows;
use crate::models::ItemTags;

stylance::import_crate_style!(css, "src/components/widgets/widgets.module.css");

/// One editable tag line. Inputs write to their own signals so typing does
/// not re-render the list.
#[derive(Clone, Copy)]
struct TagRow {
    id: usize,
    key: RwSignal<String>,
    value: RwSignal<String>,
}

impl TagRow {
    fn new(id: usize, key: &str, value: &str) -> Self {
        Self {
            id,
            key: RwSignal::new(key.to_string()),
            value: RwSignal::new(value.to_string()),
        }
    }
}

fn rows_from_tags(tags: &ItemTags) -> Vec<TagRow> {
    tags.iter()
        .enumerate()
        .map(|(id, (key, value))| TagRow::new(id, key, value))
        .collect()
}

/// Tag editor of one object (or one version of it).
///
/// Saving validates the rows first; server errors surface through the
/// dialog state of the browser session.
#[component]
pub fn MetadataPanel(path: String, version: Option<String>) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");

    let rows = RwSignal::new(Vec::<TagRow>::new());
    let next_id = StoredValue::new(0usize);
    let (local_error, set_local_error) = signal(None::<String>);

    let tags = {
        let path = path.clone();
        let version = version.clone();
        LocalResource::new(move || {
            let session = ctx.session();
            let path = path.clone();
            let version = version.clone();
            async move {
                session
                    .tags(&path, version.as_deref())
                    .await
                    .map_err(|e| e.to_string())
            }
        })
    };

    Effect::new(move |_| {
        if let Some(Ok(loaded)) = tags.get() {
            let loaded = rows_from_tags(&loaded);
            next_id.set_value(loaded.len());
            rows.set(loaded);
        }
    });

    let add_row = move |_| {
        let id = next_id.get_value();
        next_id.set_value(id + 1);
        rows.update(|r| r.push(TagRow::new(id, "", "")));
    };

    let busy = Signal::derive(move || ctx.browser(|s| s.dialog.busy));
    let server_error = Signal::derive(move || ctx.browser(|s| s.dialog.error.clone()));

    let on_save = move |_| {
        let pairs: Vec<(String, String)> = rows
            .get_untracked()
            .iter()
            .map(|row| (row.key.get_untracked(), row.value.get_untracked()))
            .collect();
        match tags_from_rows(&pairs) {
            Err(error) => set_local_error.set(Some(error.to_string())),
            Ok(tags) => {
                set_local_error.set(None);
                let path = path.clone();
                let version = version.clone();
                ctx.spawn(move |session| async move {
                    session.update_tags(&path, version.as_deref(), tags).await
                });
            }
        }
    };

    view! {
        <div class=css::metadata>
            <Suspense fallback=move || view! { <div class=css::muted>"Loading tags..."</div> }>
                {move || tags.get().map(|result| match result {
                    Err(message) => view! { <div class=css::errorText>{message}</div> }.into_any(),
                    Ok(_) => view! {
                        <div class=css::tagRows>
                            <For
                                each=move || rows.get()
                                key=|row| row.id
                                children=move |row| {
                                    let remove = move |_| {
                                        rows.update(|r| r.retain(|other| other.id != row.id));
                                    };
                                    view! {
                                        <div class=css::tagRow>
                                            <input
                                                class=css::tagInput
                                                placeholder="Name"
                                                prop:value=row.key
                                                on:input=move |ev| row.key.set(event_target_value(&ev))
                                            />
                                            <input
                                                class=css::tagInput
                                                placeholder="Value"
                                                prop:value=row.value
                                                on:input=move |ev| row.value.set(event_target_value(&ev))
                                            />
                                            <button class=css::iconButton title="Remove tag" on:click=remove>
                                                <Icon icon=ic::CLOSE />
                                            </button>
                                        </div>
                                    }
                                }
                            />
                            <Show when=move || rows.with(Vec::is_empty)>
                                <div class=css::muted>"No tags"</div>
                            </Show>
                        </div>
                    }
                    .into_any(),
                })}
            </Suspense>
            {move || {
                local_error
                    .get()
                    .or_else(|| server_error.get())
                    .map(|message| view! { <div class=css::errorText>{message}</div> })
            }}
            <div class=css::metadataActions>
                <button class=css::secondaryButton on:click=add_row>
                    <Icon icon=ic::TAG />
                    "Add tag"
                </button>
                <button class=css::primaryButton on:click=on_save disabled=busy>
                    {move || if busy.get() { "Saving..." } else { "Save" }}
                </button>
            </div>
        </div>
    }
}

/// Read-only preview of the first bytes of a text file.
#[component]
pub fn FilePreview(path: String, version: Option<String>) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");

    let content = LocalResource::new(move || {
        let session = ctx.session();
        let path = path.clone();
        let version = version.clone();
        async move {
            session
                .content(&path, version.as_deref())
                .await
                .map_err(|e| e.to_string())
        }
    });

    view! {
        <div class=css::preview>
            <Suspense fallback=move || view! { <div class=css::muted>"Loading preview..."</div> }>
                {move || content.get().map(|result| match result {
                    Ok(file) => match file.text() {
                        Some(text) => view! {
                            <pre class=css::previewText>{text}</pre>
                            {file.truncated.then(|| view! {
                                <div class=css::muted>"Preview is truncated"</div>
                            })}
                        }
                        .into_any(),
                        None => view! { <div class=css::muted>"Binary file, no preview"</div> }.into_any(),
                    },
                    Err(message) => view! { <div class=css::errorText>{message}</div> }.into_any(),
                })}
            </Suspense>
        </div>
    }
}
