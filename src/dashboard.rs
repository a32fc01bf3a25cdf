use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use logtally_analytics::{AnalyticsEngine, DashboardSnapshot};
use logtally_store::LogStore;
use logtally_tui::{
    Action, AppState, DashboardScreen, Event, EventHandler, KeyBindings, KeyContext, Tui,
};

const TICK_RATE: Duration = Duration::from_millis(250);

type RefreshResult = std::result::Result<DashboardSnapshot, String>;

/// Run the full-screen dashboard until the user quits
pub async fn run<S>(
    engine: Arc<AnalyticsEngine<S>>,
    top_n: usize,
    days: u32,
    refresh_every: Duration,
) -> Result<()>
where
    S: LogStore + 'static,
{
    let (snapshot_tx, mut snapshot_rx) = mpsc::unbounded_channel::<RefreshResult>();

    let mut state = AppState::new(top_n, days);
    let keybindings = KeyBindings::new();

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(TICK_RATE, refresh_every);

    // First snapshot
    if state.apply(Action::Refresh) {
        spawn_refresh(&engine, &state, snapshot_tx.clone());
    }
    render(&mut tui, &mut state)?;

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                let action = match event {
                    Event::Key(key) => {
                        let context = if state.help_visible {
                            KeyContext::Help
                        } else {
                            KeyContext::Dashboard
                        };
                        keybindings.get_action(context, &key)
                    }
                    Event::Refresh => Some(Action::Refresh),
                    Event::Tick | Event::Resize(_, _) => Some(Action::Render),
                    Event::Error(e) => {
                        state.show_error(e);
                        None
                    }
                };

                if let Some(action) = action {
                    if state.apply(action) {
                        spawn_refresh(&engine, &state, snapshot_tx.clone());
                    }
                }
            }

            Some(result) = snapshot_rx.recv() => {
                let again = match result {
                    Ok(snapshot) => state.set_snapshot(snapshot),
                    Err(e) => state.refresh_failed(e),
                };
                if again {
                    spawn_refresh(&engine, &state, snapshot_tx.clone());
                }
            }

            else => break,
        }

        if state.should_quit {
            break;
        }

        render(&mut tui, &mut state)?;
    }

    // Cleanup
    events.shutdown();
    tui.restore()?;

    Ok(())
}

/// Compute a snapshot with the current row count and window on the blocking
/// pool and send it back to the loop
fn spawn_refresh<S>(
    engine: &Arc<AnalyticsEngine<S>>,
    state: &AppState,
    tx: mpsc::UnboundedSender<RefreshResult>,
) where
    S: LogStore + 'static,
{
    let engine = Arc::clone(engine);
    let (top_n, days) = (state.top_n, state.days);
    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || engine.snapshot(top_n, days))
            .await
            .map_err(|e| format!("Refresh failed: {}", e));
        let _ = tx.send(result);
    });
}

fn render(tui: &mut Tui, state: &mut AppState) -> Result<()> {
    tui.terminal()
        .draw(|frame| DashboardScreen::render(frame, state))?;
    Ok(())
}
