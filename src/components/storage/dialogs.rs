//! Modal dialogs of the browser.
//!
//! Only one dialog is open at a time; which one, whether it is submitting
//! and its last error all live in the browser store. A failed submission
//! keeps the dialog open with the error, a successful one closes it.

use leptos::prelude::*;
use leptos_icons::Icon;

use crate::app::AppContext;
use crate::components::icons as ic;
use crate::components::widgets::{FilePreview, MetadataPanel};
use crate::config::DEFAULT_RESTORE_DAYS;
use crate::core::LifecycleRestoreForm;
use crate::core::restore::RestoreMode;
use crate::core::validation::parse_days;
use crate::models::{BrowserDialog, ItemKey, ItemType};

stylance::import_crate_style!(css, "src/components/storage/dialogs.module.css");

/// Notification recipients typed as a comma, semicolon or space separated list.
pub fn parse_recipients(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[component]
pub fn Dialogs() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let dialog = Memo::new(move |_| ctx.browser(|s| s.dialog.dialog.clone()));

    move || match dialog.get() {
        BrowserDialog::None => ().into_any(),
        BrowserDialog::CreateFolder => view! {
            <NameDialog title="Create folder" initial=String::new() submit_label="Create"
                on_submit=Callback::new(move |name: String| {
                    ctx.spawn(move |s| async move { s.create_item(ItemType::Folder, &name).await });
                })
            />
        }
        .into_any(),
        BrowserDialog::CreateFile => view! {
            <NameDialog title="Create file" initial=String::new() submit_label="Create"
                on_submit=Callback::new(move |name: String| {
                    ctx.spawn(move |s| async move { s.create_item(ItemType::File, &name).await });
                })
            />
        }
        .into_any(),
        BrowserDialog::Rename { item } => view! { <RenameDialog item=item /> }.into_any(),
        BrowserDialog::EditTags { path, version } => view! {
            <Modal title="Tags">
                <MetadataPanel path=path.clone() version=version.clone() />
                <FilePreview path=path version=version />
            </Modal>
        }
        .into_any(),
        BrowserDialog::DeleteConfirmation { items, totally } => {
            view! { <DeleteDialog items=items totally=totally /> }.into_any()
        }
        BrowserDialog::ConvertToVersioned => view! { <ConvertDialog /> }.into_any(),
        BrowserDialog::DownloadUrls { urls } => view! { <DownloadDialog urls=urls /> }.into_any(),
        BrowserDialog::LifecycleRestore { paths } => {
            view! { <RestoreDialog paths=paths /> }.into_any()
        }
    }
}

// =============================================================================
// Frame
// =============================================================================

#[component]
fn Modal(title: &'static str, children: Children) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let busy = Signal::derive(move || ctx.browser(|s| s.dialog.busy));

    let close = move |_| {
        if !busy.get_untracked() {
            ctx.session().close_dialog();
        }
    };

    view! {
        <div class=css::backdrop>
            <div class=css::modal role="dialog" aria-modal="true" aria-label=title>
                <header class=css::header>
                    <h2 class=css::title>{title}</h2>
                    <button class=css::closeButton title="Close" on:click=close>
                        <Icon icon=ic::CLOSE />
                    </button>
                </header>
                <div class=css::body>{children()}</div>
            </div>
        </div>
    }
}

/// Error line and the cancel/submit buttons.
#[component]
fn Footer(
    submit_label: &'static str,
    #[prop(into)] disabled: Signal<bool>,
    on_submit: Callback<()>,
    #[prop(optional)] danger: bool,
) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let busy = Signal::derive(move || ctx.browser(|s| s.dialog.busy));
    let error = Signal::derive(move || ctx.browser(|s| s.dialog.error.clone()));

    let submit_class = if danger {
        format!("{} {}", css::submit, css::danger)
    } else {
        css::submit.to_string()
    };

    view! {
        {move || error.get().map(|message| view! { <div class=css::error role="alert">{message}</div> })}
        <footer class=css::footer>
            <button
                class=css::cancel
                disabled=busy
                on:click=move |_| ctx.session().close_dialog()
            >
                "Cancel"
            </button>
            <button
                class=submit_class
                disabled=move || busy.get() || disabled.get()
                on:click=move |_| on_submit.run(())
            >
                {move || if busy.get() { "Working..." } else { submit_label }}
            </button>
        </footer>
    }
}

// =============================================================================
// Dialogs
// =============================================================================

#[component]
fn NameDialog(
    title: &'static str,
    initial: String,
    submit_label: &'static str,
    on_submit: Callback<String>,
) -> impl IntoView {
    let (name, set_name) = signal(initial.clone());
    let unchanged = Signal::derive(move || {
        let name = name.get();
        name.trim().is_empty() || (!initial.is_empty() && name == initial)
    });
    let submit = Callback::new(move |_: ()| on_submit.run(name.get_untracked()));

    view! {
        <Modal title=title>
            <form on:submit=move |ev| {
                ev.prevent_default();
                if !unchanged.get_untracked() {
                    submit.run(());
                }
            }>
                <label class=css::field>
                    <span>"Name"</span>
                    <input
                        class=css::input
                        autofocus
                        prop:value=name
                        on:input=move |ev| set_name.set(event_target_value(&ev))
                    />
                </label>
            </form>
            <Footer submit_label=submit_label disabled=unchanged on_submit=submit />
        </Modal>
    }
}

#[component]
fn RenameDialog(item: ItemKey) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let title = match item.item_type {
        ItemType::Folder => "Rename folder",
        ItemType::File => "Rename file",
    };
    let initial = item.name.clone();
    let on_submit = Callback::new(move |name: String| {
        let item = item.clone();
        ctx.spawn(move |s| async move { s.rename(&item, &name).await });
    });

    view! { <NameDialog title=title initial=initial submit_label="Rename" on_submit=on_submit /> }
}

#[component]
fn DeleteDialog(items: Vec<ItemKey>, totally: bool) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let (totally, set_totally) = signal(totally);
    let versioned = Signal::derive(move || {
        ctx.browser(|s| s.listing.info().is_some_and(|info| info.is_versioned()))
    });

    let names = items
        .iter()
        .map(|item| {
            let icon = match item.item_type {
                ItemType::Folder => ic::FOLDER,
                ItemType::File => ic::FILE,
            };
            view! {
                <li class=css::listItem>
                    <Icon icon=icon />
                    {item.name.clone()}
                </li>
            }
        })
        .collect_view();

    let on_submit = Callback::new(move |_: ()| {
        let items = items.clone();
        let totally = totally.get_untracked();
        ctx.spawn(move |s| async move { s.delete(&items, totally).await });
    });

    view! {
        <Modal title="Delete">
            <p>"The following entries will be deleted:"</p>
            <ul class=css::list>{names}</ul>
            <Show when=move || versioned.get()>
                <label class=css::checkbox>
                    <input
                        type="checkbox"
                        prop:checked=totally
                        on:change=move |ev| set_totally.set(event_target_checked(&ev))
                    />
                    "Also delete all previous versions"
                </label>
            </Show>
            <Footer submit_label="Delete" disabled=false on_submit=on_submit danger=true />
        </Modal>
    }
}

#[component]
fn ConvertDialog() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let on_submit = Callback::new(move |_: ()| {
        ctx.spawn(|s| async move { s.convert_to_versioned().await });
    });

    view! {
        <Modal title="Enable versioning">
            <p>
                "Every change to an object will keep the previous content as a version. "
                "Versioning cannot be disabled afterwards."
            </p>
            <Footer submit_label="Enable" disabled=false on_submit=on_submit />
        </Modal>
    }
}

#[component]
fn DownloadDialog(urls: Vec<String>) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let links = urls
        .into_iter()
        .map(|url| {
            let label = url
                .split('?')
                .next()
                .and_then(|base| base.rsplit('/').next())
                .unwrap_or(&url)
                .to_string();
            view! {
                <li class=css::listItem>
                    <Icon icon=ic::DOWNLOAD />
                    <a href=url target="_blank" rel="noopener">{label}</a>
                </li>
            }
        })
        .collect_view();

    view! {
        <Modal title="Download links">
            <p>"Links expire after a while; generate them again if they stop working."</p>
            <ul class=css::list>{links}</ul>
            <footer class=css::footer>
                <button class=css::submit on:click=move |_| ctx.session().close_dialog()>
                    "Done"
                </button>
            </footer>
        </Modal>
    }
}

#[component]
fn RestoreDialog(paths: Vec<String>) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let (days, set_days) = signal(DEFAULT_RESTORE_DAYS.to_string());
    let (restore_versions, set_restore_versions) = signal(false);
    let (bulk, set_bulk) = signal(false);
    let (recipients, set_recipients) = signal(String::new());
    let (days_error, set_days_error) = signal(None::<String>);
    let versioned = Signal::derive(move || {
        ctx.browser(|s| s.listing.info().is_some_and(|info| info.is_versioned()))
    });

    let count = paths.len();
    let on_submit = Callback::new(move |_: ()| {
        let days = match parse_days(&days.get_untracked()) {
            Ok(days) => days,
            Err(error) => {
                set_days_error.set(Some(error.to_string()));
                return;
            }
        };
        set_days_error.set(None);
        let form = LifecycleRestoreForm {
            days,
            restore_versions: restore_versions.get_untracked(),
            mode: if bulk.get_untracked() {
                RestoreMode::Bulk
            } else {
                RestoreMode::Standard
            },
            recipients: parse_recipients(&recipients.get_untracked()),
        };
        let paths = paths.clone();
        ctx.spawn(move |s| async move { s.request_lifecycle_restore(&paths, form).await });
    });

    view! {
        <Modal title="Restore from archive">
            <p>{format!("{count} archived entr{} will be restored.", if count == 1 { "y" } else { "ies" })}</p>
            <label class=css::field>
                <span>"Keep restored for (days)"</span>
                <input
                    class=css::input
                    inputmode="numeric"
                    prop:value=days
                    on:input=move |ev| set_days.set(event_target_value(&ev))
                />
            </label>
            {move || days_error.get().map(|message| view! { <div class=css::error>{message}</div> })}
            <Show when=move || versioned.get()>
                <label class=css::checkbox>
                    <input
                        type="checkbox"
                        prop:checked=restore_versions
                        on:change=move |ev| set_restore_versions.set(event_target_checked(&ev))
                    />
                    "Restore previous versions too"
                </label>
            </Show>
            <label class=css::checkbox>
                <input
                    type="checkbox"
                    prop:checked=bulk
                    on:change=move |ev| set_bulk.set(event_target_checked(&ev))
                />
                "Bulk mode (slower, cheaper)"
            </label>
            <label class=css::field>
                <span>"Notify when done"</span>
                <input
                    class=css::input
                    placeholder="user1, user2"
                    prop:value=recipients
                    on:input=move |ev| set_recipients.set(event_target_value(&ev))
                />
            </label>
            <Footer submit_label="Restore" disabled=false on_submit=on_submit />
        </Modal>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recipients() {
        assert_eq!(
            parse_recipients(" ana, bo;cy  dee "),
            vec!["ana", "bo", "cy", "dee"]
        );
        assert!(parse_recipients(" , ; ").is_empty());
    }
}
