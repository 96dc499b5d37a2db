//! Browser bindings: a `WebSocket` transport and `setTimeout` expiry.
//!
//! Everything runs on the page's event loop, so shared state lives in
//! `Rc<RefCell<_>>` and each callback borrows it only for its own turn.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

use super::commands::{CommandDispatcher, FrameSink, LinkRequest};
use super::error::SyncError;
use super::overlay::ExpiryScheduler;
use super::protocol::PeerId;
use super::session::{Session, SessionState, endpoint_url};
use super::settings::{DisplaySettings, LiveSettings, SettingKind};
use super::store::EdgeId;
use super::translator::{Applied, SyncEngine};
use crate::config::SyncConfig;

fn transport_error(e: JsValue) -> SyncError {
	SyncError::Transport(format!("{e:?}"))
}

struct SocketSink<'a>(&'a WebSocket);

impl FrameSink for SocketSink<'_> {
	fn send_text(&mut self, text: &str) -> Result<(), SyncError> {
		self.0.send_with_str(text).map_err(transport_error)
	}
}

/// Pending timeouts and the callbacks they hold, keyed by edge id.
///
/// A callback cannot be dropped while it runs, so a fired one is parked in
/// `spent` and freed on the next schedule or cancel.
struct TimerTable<C> {
	pending: HashMap<EdgeId, (i32, C)>,
	spent: Vec<C>,
}

impl<C> Default for TimerTable<C> {
	fn default() -> Self {
		Self {
			pending: HashMap::new(),
			spent: Vec::new(),
		}
	}
}

impl<C> TimerTable<C> {
	/// Track a new timeout. Returns the handle it replaced, if any.
	fn insert(&mut self, id: EdgeId, handle: i32, callback: C) -> Option<i32> {
		self.spent.clear();
		self.pending
			.insert(id, (handle, callback))
			.map(|(handle, _)| handle)
	}

	/// Forget a timeout that will not fire, freeing its callback.
	fn cancel(&mut self, id: EdgeId) -> Option<i32> {
		self.spent.clear();
		self.pending.remove(&id).map(|(handle, _)| handle)
	}

	/// A timeout fired; keep its callback alive until it has returned.
	fn fired(&mut self, id: EdgeId) {
		if let Some((_, callback)) = self.pending.remove(&id) {
			self.spent.push(callback);
		}
	}
}

/// Overlay expiry on `window.setTimeout`, keyed by edge id.
#[derive(Clone)]
struct BrowserTimers {
	session: Weak<RefCell<Session>>,
	table: Rc<RefCell<TimerTable<Closure<dyn FnMut()>>>>,
}

impl ExpiryScheduler for BrowserTimers {
	fn schedule(&mut self, id: EdgeId, after: Duration) {
		let Some(window) = web_sys::window() else {
			warn!("sync: no window, overlay {id} will not expire");
			return;
		};
		let (session, table) = (self.session.clone(), Rc::downgrade(&self.table));
		let callback = Closure::<dyn FnMut()>::new(move || {
			if let Some(table) = table.upgrade() {
				table.borrow_mut().fired(id);
			}
			if let Some(session) = session.upgrade() {
				session.borrow_mut().expire(id);
			}
		});
		match window.set_timeout_with_callback_and_timeout_and_arguments_0(
			callback.as_ref().unchecked_ref(),
			after.as_millis() as i32,
		) {
			Ok(handle) => {
				if let Some(stale) = self.table.borrow_mut().insert(id, handle, callback) {
					window.clear_timeout_with_handle(stale);
				}
			}
			Err(e) => warn!("sync: failed to schedule expiry of {id}: {e:?}"),
		}
	}

	fn cancel(&mut self, id: EdgeId) {
		let Some(handle) = self.table.borrow_mut().cancel(id) else {
			return;
		};
		if let Some(window) = web_sys::window() {
			window.clear_timeout_with_handle(handle);
		}
	}
}

/// Keeps the socket callbacks alive for as long as the session is.
struct Handlers {
	_open: Closure<dyn FnMut()>,
	_message: Closure<dyn FnMut(MessageEvent)>,
	_close: Closure<dyn FnMut(CloseEvent)>,
	_error: Closure<dyn FnMut(Event)>,
}

/// A live observer connection, shared by the canvas and the settings panel.
#[derive(Clone)]
pub struct LiveSession {
	inner: Rc<RefCell<Session>>,
	socket: WebSocket,
	/// Authoritative link settings, mirrored for the UI.
	pub live: RwSignal<LiveSettings>,
	pub state: RwSignal<SessionState>,
	_handlers: Rc<Handlers>,
}

impl LiveSession {
	/// Open the socket on the page's host and wire it to a fresh engine.
	pub fn connect(config: &SyncConfig, display: RwSignal<DisplaySettings>) -> Result<Self, SyncError> {
		let location = web_sys::window()
			.ok_or_else(|| SyncError::Transport("no window".to_string()))?
			.location();
		let url = endpoint_url(
			&location.protocol().map_err(transport_error)?,
			&location.host().map_err(transport_error)?,
			&config.endpoint_path,
		);
		let socket = WebSocket::new(&url).map_err(transport_error)?;
		info!("sync: connecting to {url}");

		let inner = Rc::new(RefCell::new(Session::new(config)));
		let timers = BrowserTimers {
			session: Rc::downgrade(&inner),
			table: Rc::default(),
		};
		let live = RwSignal::new(inner.borrow().engine().settings().clone());
		let state = RwSignal::new(SessionState::Connecting);

		let (inner_open, socket_open) = (inner.clone(), socket.clone());
		let open = Closure::<dyn FnMut()>::new(move || {
			match inner_open.borrow_mut().on_open(&mut SocketSink(&socket_open)) {
				Ok(()) => state.set(SessionState::Observing),
				Err(e) => warn!("sync: handshake failed: {e}"),
			}
		});

		let (inner_message, timers_message) = (inner.clone(), timers.clone());
		let message = Closure::<dyn FnMut(MessageEvent)>::new(move |ev: MessageEvent| {
			let Some(text) = ev.data().as_string() else {
				warn!("sync: ignoring non-text frame");
				return;
			};
			let mut timers = timers_message.clone();
			let applied =
				inner_message
					.borrow_mut()
					.on_frame(&text, &display.get_untracked(), &mut timers);
			if let Some(Applied::SettingChanged(_)) = applied {
				live.set(inner_message.borrow().engine().settings().clone());
			}
		});

		let inner_close = inner.clone();
		let close = Closure::<dyn FnMut(CloseEvent)>::new(move |ev: CloseEvent| {
			info!("sync: socket closed ({} {})", ev.code(), ev.reason());
			inner_close.borrow_mut().on_close(&mut timers.clone());
			state.set(SessionState::Closed);
		});

		let error = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
			warn!("sync: socket error");
		});

		socket.set_onopen(Some(open.as_ref().unchecked_ref()));
		socket.set_onmessage(Some(message.as_ref().unchecked_ref()));
		socket.set_onclose(Some(close.as_ref().unchecked_ref()));
		socket.set_onerror(Some(error.as_ref().unchecked_ref()));

		Ok(Self {
			inner,
			socket,
			live,
			state,
			_handlers: Rc::new(Handlers {
				_open: open,
				_message: message,
				_close: close,
				_error: error,
			}),
		})
	}

	/// Borrow the engine for the duration of `f`.
	pub fn with_engine<R>(&self, f: impl FnOnce(&mut SyncEngine) -> R) -> R {
		f(self.inner.borrow_mut().engine_mut())
	}

	/// Link gesture from the canvas.
	pub fn request_link_toggle(&self, a: &PeerId, b: &PeerId) {
		if let Some(request) =
			self.with_commands(|commands, engine| commands.request_link_toggle(engine.store(), a, b))
		{
			let verb = match request {
				LinkRequest::Add => "link",
				LinkRequest::Remove => "unlink",
			};
			info!("sync: requested {verb} {a} <-> {b}");
		}
	}

	/// Slider change from the settings panel.
	pub fn request_setting(&self, kind: SettingKind, value: f64) {
		let sent = self.with_commands(|commands, engine| match kind {
			SettingKind::Reliability => commands.request_set_reliability(engine.settings_mut(), value),
			SettingKind::Delay => commands.request_set_delay(engine.settings_mut(), value),
		});
		if sent.is_some() {
			self.live.set(self.inner.borrow().engine().settings().clone());
		}
	}

	fn with_commands<R>(
		&self,
		f: impl FnOnce(&mut CommandDispatcher<'_>, &mut SyncEngine) -> Result<R, SyncError>,
	) -> Option<R> {
		let mut session = self.inner.borrow_mut();
		let mut sink = SocketSink(&self.socket);
		let result = session.ensure_observing().and_then(|()| {
			let mut commands = CommandDispatcher::new(&mut sink);
			f(&mut commands, session.engine_mut())
		});
		match result {
			Ok(value) => Some(value),
			Err(e) => {
				warn!("sync: command not sent: {e}");
				None
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::super::store::{GraphStore, Position};
	use super::*;

	fn edge_ids() -> (EdgeId, EdgeId) {
		let mut store = GraphStore::new();
		for p in ["a", "b", "c"] {
			store.add_node(p.into(), p.to_string(), Position::default());
		}
		let ab = store.add_edge(&"a".into(), &"b".into()).unwrap();
		let bc = store.add_edge(&"b".into(), &"c".into()).unwrap();
		(ab, bc)
	}

	#[test]
	fn cancelled_timeouts_free_their_callbacks() {
		let (one, two) = edge_ids();
		let mut table = TimerTable::default();
		let callback = Rc::new(());
		table.insert(one, 10, callback.clone());
		table.insert(two, 11, callback.clone());
		assert_eq!(Rc::strong_count(&callback), 3);

		assert_eq!(table.cancel(one), Some(10));
		assert_eq!(Rc::strong_count(&callback), 2);
		assert_eq!(table.cancel(one), None);
	}

	#[test]
	fn fired_callbacks_are_freed_on_the_next_call() {
		let (one, _) = edge_ids();
		let mut table = TimerTable::default();
		let callback = Rc::new(());
		table.insert(one, 10, callback.clone());

		table.fired(one);
		assert_eq!(Rc::strong_count(&callback), 2);
		assert_eq!(table.cancel(one), None);
		assert_eq!(Rc::strong_count(&callback), 1);
	}

	#[test]
	fn rescheduling_returns_the_stale_handle() {
		let (one, _) = edge_ids();
		let mut table = TimerTable::default();
		assert_eq!(table.insert(one, 10, ()), None);
		assert_eq!(table.insert(one, 11, ()), Some(10));
	}
}
