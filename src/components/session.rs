//! Header badge: current user, login form and logout.

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use super::hooks::use_session;
use crate::app::AppContext;
use crate::models::SessionState;

#[component]
pub fn SessionBadge() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let session = use_session();

    view! {
        <div class="session">
            {move || {
                let state = session.get();
                match state {
                    SessionState::Anonymous => view! { <LoginForm /> }.into_any(),
                    SessionState::Resolving { .. } => view! {
                        <span class="session-user">{state.display_name()}</span>
                    }.into_any(),
                    SessionState::Authenticated { .. } => view! {
                        <span class="session-user">{state.display_name()}</span>
                        <button on:click=move |_| ctx.logout()>"Log out"</button>
                    }.into_any(),
                }
            }}
        </div>
    }
}

#[component]
fn LoginForm() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let error = RwSignal::new(None::<String>);
    let pending = RwSignal::new(false);

    let submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if pending.get_untracked() {
            return;
        }
        pending.set(true);
        error.set(None);

        let sessions = ctx.sessions.get_value();
        let (email, password) = (email.get_untracked(), password.get_untracked());
        spawn_local(async move {
            if let Err(e) = sessions.login(&email, &password).await {
                error.set(Some(e.to_string()));
            }
            pending.set(false);
        });
    };

    view! {
        <form class="login" on:submit=submit>
            <input
                type="email"
                placeholder="Email"
                prop:value=move || email.get()
                on:input=move |ev| email.set(event_target_value(&ev))
            />
            <input
                type="password"
                placeholder="Password"
                prop:value=move || password.get()
                on:input=move |ev| password.set(event_target_value(&ev))
            />
            <button type="submit" disabled=move || pending.get()>"Log in"</button>
            {move || error.get().map(|msg| view! { <span class="error">{msg}</span> })}
        </form>
    }
}
