use parlor_core::otp;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlInputElement};
use yew::prelude::*;

fn backend_url() -> &'static str {
    option_env!("BACKEND_URL").unwrap_or("http://127.0.0.1:8080")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct NewSessionRequest {
    client_seed: Option<String>,
}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct NewSessionResponse {
    session_id: String,
    server_seed_hash: String,
    client_seed: String,
    balance: f64,
    drop_threshold: f64,
}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct PlayRequest {
    sign: u8,
    bet: f64,
    active_card: Option<usize>,
}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct CardView {
    name: String,
    multiplier: f64,
}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct PlayResponse {
    nonce: u64,
    player_sign: u8,
    system_sign: u8,
    outcome: String,
    payout: f64,
    balance: f64,
    hash: String,
    bonus_card: Option<String>,
    dropped_card: Option<CardView>,
    inventory: Vec<CardView>,
    busted: bool,
}

const SIGN_NAMES: [&str; 3] = ["scissors", "rock", "paper"];

fn current_code(secret: &str) -> String {
    if secret.trim().is_empty() {
        return String::new();
    }
    // Codes are computed locally; the secret never leaves the browser.
    let now = (js_sys::Date::now() / 1000.0) as u64;
    match otp::totp(secret, otp::DEFAULT_TIME_STEP_SECS, now) {
        Ok(code) => format!(
            "{} ({}s left)",
            code,
            otp::seconds_remaining(otp::DEFAULT_TIME_STEP_SECS, now)
        ),
        Err(err) => format!("invalid secret: {err}"),
    }
}

#[function_component(App)]
fn app() -> Html {
    let client_seed = use_state(|| "demo-seed".to_string());
    let session = use_state(|| None as Option<NewSessionResponse>);
    let rounds = use_state(Vec::<PlayResponse>::new);
    let totp_secret = use_state(String::new);
    let totp_code = use_state(String::new);

    let play = {
        let client_seed = client_seed.clone();
        let session = session.clone();
        let rounds = rounds.clone();
        Callback::from(move |sign: u8| {
            let client_seed = (*client_seed).clone();
            let session = session.clone();
            let rounds = rounds.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let client = reqwest::Client::new();
                let current = match (*session).clone() {
                    Some(existing) => existing,
                    None => {
                        let req = NewSessionRequest {
                            client_seed: Some(client_seed),
                        };
                        let created = match client
                            .post(format!("{}/session", backend_url()))
                            .json(&req)
                            .send()
                            .await
                        {
                            Ok(r) => r.json::<NewSessionResponse>().await.ok(),
                            Err(_) => None,
                        };
                        match created {
                            Some(s) => {
                                session.set(Some(s.clone()));
                                s
                            }
                            None => return,
                        }
                    }
                };
                let req = PlayRequest {
                    sign,
                    bet: 100.0,
                    active_card: None,
                };
                let resp = match client
                    .post(format!(
                        "{}/session/{}/play",
                        backend_url(),
                        current.session_id
                    ))
                    .json(&req)
                    .send()
                    .await
                {
                    Ok(r) => r.json::<PlayResponse>().await.ok(),
                    Err(_) => None,
                };
                if let Some(resp) = resp {
                    let mut next = (*rounds).clone();
                    next.push(resp);
                    rounds.set(next);
                }
            });
        })
    };

    let on_secret_input = {
        let totp_secret = totp_secret.clone();
        let totp_code = totp_code.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let secret = input.value();
            totp_code.set(current_code(&secret));
            totp_secret.set(secret);
        })
    };

    let refresh_code = {
        let totp_secret = totp_secret.clone();
        let totp_code = totp_code.clone();
        Callback::from(move |_| {
            totp_code.set(current_code(totp_secret.as_str()));
        })
    };

    let last = (*rounds).last().cloned();

    html! {
        <div>
            <h1>{"Parlor (Demo)"}</h1>

            <h2>{"Rock · Paper · Scissors"}</h2>
            <input value={(*client_seed).clone()} oninput={{ let client_seed = client_seed.clone(); Callback::from(move |e: InputEvent| { let input: HtmlInputElement = e.target_unchecked_into(); client_seed.set(input.value()); }) }} />
            { for (0u8..3).map(|sign| {
                let play = play.clone();
                html! { <button onclick={Callback::from(move |_| play.emit(sign))}>{SIGN_NAMES[sign as usize]}</button> }
            }) }
            <Canvas rounds={(*rounds).clone()} />
            if let Some(res) = &last {
                <pre>{format!(
                    "you={} system={} outcome={} payout={} balance={}\nnonce={} hash={}",
                    SIGN_NAMES[res.player_sign as usize],
                    SIGN_NAMES[res.system_sign as usize],
                    res.outcome, res.payout, res.balance, res.nonce, res.hash
                )}</pre>
            }
            if let Some(s) = &*session {
                <p>{format!("server seed commit: {} (revealed when the session ends)", s.server_seed_hash)}</p>
            }

            <h2>{"TOTP codes"}</h2>
            <input placeholder="Base32 secret" value={(*totp_secret).clone()} oninput={on_secret_input} />
            <button onclick={refresh_code}>{"Refresh"}</button>
            if !(*totp_code).is_empty() {
                <pre>{(*totp_code).clone()}</pre>
            }
            <p>{"The secret stays in this page; codes are derived locally."}</p>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct CanvasProps {
    rounds: Vec<PlayResponse>,
}

// Last ten outcomes as a strip of colored squares.
#[function_component(Canvas)]
fn canvas(props: &CanvasProps) -> Html {
    let node_ref = use_node_ref();
    {
        let node_ref = node_ref.clone();
        let rounds = props.rounds.clone();
        use_effect_with(rounds, move |rounds| {
            if let Some(canvas) = node_ref.cast::<HtmlCanvasElement>() {
                let ctx: CanvasRenderingContext2d = canvas
                    .get_context("2d")
                    .unwrap()
                    .unwrap()
                    .dyn_into()
                    .unwrap();
                ctx.set_fill_style(&JsValue::from_str("#111"));
                ctx.fill_rect(0.0, 0.0, 300.0, 40.0);
                let recent = rounds.iter().rev().take(10).rev();
                for (i, round) in recent.enumerate() {
                    let x = (i as f64) * 30.0 + 2.0;
                    ctx.set_fill_style(&JsValue::from_str(match round.outcome.as_str() {
                        "win" => "#2ecc71",
                        "draw" => "#f1c40f",
                        _ => "#e74c3c",
                    }));
                    ctx.fill_rect(x, 6.0, 26.0, 28.0);
                }
            }
        });
    }

    html! { <canvas ref={node_ref} width="300" height="40"></canvas> }
}

#[wasm_bindgen(start)]
pub fn run() {
    yew::Renderer::<App>::new().render();
}
