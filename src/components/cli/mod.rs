//! CLI configuration screen.
//!
//! Issues an access token for a chosen number of days and shows the
//! `pip install` and `pipe configure` commands with it filled in. Git
//! credentials are issued for the same duration.

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_icons::Icon;

use crate::app::AppContext;
use crate::components::icons as ic;
use crate::components::widgets::BashCodeBlock;
use crate::config::{AppConfig, DEFAULT_TOKEN_DURATION_DAYS};
use crate::core::UsersApi;
use crate::core::cli_template::{CliContext, jwt_expiration};
use crate::core::validation::parse_days;
use crate::models::{AccessToken, GitCredentials};
use crate::utils::dom::{origin, resolve_url};
use crate::utils::format::format_date_iso;

stylance::import_crate_style!(css, "src/components/cli/cli.module.css");

/// Template values for this deployment; the API URL ends with `/`.
fn cli_context(config: &AppConfig, origin: &str, token: Option<String>) -> CliContext {
    let api_url = resolve_url(origin, &config.api.api_path);
    let api_url = if api_url.ends_with('/') {
        api_url
    } else {
        format!("{api_url}/")
    };
    CliContext {
        token,
        api_url,
        pipe_cli_url: resolve_url(origin, &config.cli.pipe_cli_path),
    }
}

/// Expiration date of a token: the server's value, else the JWT `exp` claim.
fn expiration_label(token: &AccessToken) -> Option<String> {
    token
        .expiration
        .as_deref()
        .map(|e| e.get(..10).unwrap_or(e).to_string())
        .or_else(|| {
            jwt_expiration(&token.token)
                .and_then(|secs| u64::try_from(secs).ok())
                .map(format_date_iso)
        })
}

#[component]
pub fn CliConfig() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let settings = ctx.config.with_value(|c| c.cli.clone());

    let (days, set_days) = signal(DEFAULT_TOKEN_DURATION_DAYS.to_string());
    let (token, set_token) = signal(None::<AccessToken>);
    let (git, set_git) = signal(None::<GitCredentials>);
    let (pending, set_pending) = signal(false);
    let (error, set_error) = signal(None::<String>);

    let page_origin = origin();
    let context = Memo::new(move |_| {
        let token = token.get().map(|t| t.token);
        ctx.config
            .with_value(|config| cli_context(config, &page_origin, token))
    });
    let pip_settings = settings.clone();
    let pip_install = Signal::derive(move || context.get().pip_install_command(&pip_settings));
    let configure = Signal::derive(move || context.get().configure_command(&settings));

    let parsed_days = move || match parse_days(&days.get_untracked()) {
        Ok(days) => {
            set_error.set(None);
            Some(days)
        }
        Err(e) => {
            set_error.set(Some(e.to_string()));
            None
        }
    };

    let generate_token = move |_| {
        let Some(days) = parsed_days() else { return };
        set_pending.set(true);
        spawn_local(async move {
            match ctx.api().access_token(days).await {
                Ok(issued) => {
                    tracing::info!(days, "access token issued");
                    set_token.set(Some(issued));
                }
                Err(e) => set_error.set(Some(e.to_string())),
            }
            set_pending.set(false);
        });
    };

    let generate_git = move |_| {
        let Some(days) = parsed_days() else { return };
        set_pending.set(true);
        spawn_local(async move {
            match ctx.api().git_credentials(days).await {
                Ok(credentials) => set_git.set(Some(credentials)),
                Err(e) => set_error.set(Some(e.to_string())),
            }
            set_pending.set(false);
        });
    };

    view! {
        <section class=css::cli>
            <h1 class=css::title>
                <Icon icon=ic::TERMINAL />
                "Command line interface"
            </h1>

            <h2 class=css::step>"1. Install the CLI"</h2>
            <BashCodeBlock code=pip_install />

            <h2 class=css::step>"2. Generate an access token"</h2>
            <div class=css::tokenForm>
                <label class=css::field>
                    <span>"Valid for (days)"</span>
                    <input
                        class=css::input
                        inputmode="numeric"
                        prop:value=days
                        on:input=move |ev| set_days.set(event_target_value(&ev))
                    />
                </label>
                <button class=css::button disabled=pending on:click=generate_token>
                    <Icon icon=ic::LOCK />
                    "Generate access key"
                </button>
                <button class=css::secondaryButton disabled=pending on:click=generate_git>
                    "Generate git credentials"
                </button>
            </div>
            {move || error.get().map(|message| view! { <div class=css::error role="alert">{message}</div> })}
            {move || {
                token
                    .get()
                    .and_then(|t| expiration_label(&t))
                    .map(|date| view! { <p class=css::hint>{format!("Token expires on {date}")}</p> })
            }}

            <h2 class=css::step>"3. Configure the CLI"</h2>
            <BashCodeBlock code=configure />
            <Show when=move || token.with(Option::is_none)>
                <p class=css::hint>"Generate an access key to fill in the token."</p>
            </Show>

            {move || git.get().map(|credentials| view! { <GitCredentialsView credentials=credentials /> })}
        </section>
    }
}

#[component]
fn GitCredentialsView(credentials: GitCredentials) -> impl IntoView {
    let rows = [
        ("URL", Some(credentials.url)),
        ("User", credentials.user_name),
        ("Email", credentials.email),
        ("Token", credentials.token),
    ];

    view! {
        <div class=css::git>
            <h2 class=css::step>"Git credentials"</h2>
            <dl class=css::credentials>
                {rows
                    .into_iter()
                    .filter_map(|(label, value)| value.map(|v| (label, v)))
                    .map(|(label, value)| view! {
                        <dt>{label}</dt>
                        <dd><code>{value}</code></dd>
                    })
                    .collect_view()}
            </dl>
        </div>
    }
}
