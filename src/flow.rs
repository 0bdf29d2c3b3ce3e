//! Flow control for the host's per-frame callback.
//!
//! A "flow" is the object the host drives: it is initialised once, then updated
//! once per rendered frame. Asynchronous work (the asset load, media start) is
//! handed back as futures that resolve into mutations of the flow; the
//! [`Session`] applies them between frames so that nothing ever blocks the
//! render loop.
//!
//! # Lifecycle Flow
//!
//! Each frame:
//! 1. Poll outstanding futures without blocking
//! 2. Apply the mutations of every future that completed
//! 3. Call `on_update` with the frame's `dt`
//! 4. Schedule whatever futures `on_update` returned

use std::{
    cell::{Cell, RefCell},
    future::Future,
    pin::Pin,
    rc::Rc,
};

#[cfg(not(target_arch = "wasm32"))]
use futures::{executor::LocalPool, task::LocalSpawnExt};
use instant::{Duration, Instant};

/// A deferred change to the flow's state.
pub type Mutation<S> = Box<dyn FnOnce(&mut S)>;

/// Work that eventually yields a [`Mutation`].
pub type Pending<S> = Pin<Box<dyn Future<Output = Mutation<S>>>>;

///
/// The output of every lifecycle hook.
///
/// `Out::FutFn` carries futures whose results mutate the flow once they resolve.
/// The mutation is applied by the session at the start of a frame; no further
/// action is required by the callee.
///
/// `Empty` is the default output used when no futures need to be handled.
///
pub enum Out<S> {
    FutFn(Vec<Pending<S>>),
    Empty,
}

impl<S> Default for Out<S> {
    fn default() -> Self {
        Self::Empty
    }
}

/// Something the host initialises once and then updates every frame.
pub trait Flow: Sized {
    /// Called once before the first frame.
    fn on_init(&mut self) -> Out<Self>;

    /// Called every frame with the wall-clock time since the previous frame.
    fn on_update(&mut self, dt: Duration) -> Out<Self>;
}

/// Drives a single [`Flow`] from the host's frame callback.
pub struct Session<F: Flow + 'static> {
    flow: F,
    #[cfg(not(target_arch = "wasm32"))]
    pool: LocalPool,
    completed: Rc<RefCell<Vec<Mutation<F>>>>,
    in_flight: Rc<Cell<usize>>,
    initialized: bool,
    last_time: Instant,
}

impl<F: Flow + 'static> Session<F> {
    pub fn new(flow: F) -> Self {
        Self {
            flow,
            #[cfg(not(target_arch = "wasm32"))]
            pool: LocalPool::new(),
            completed: Rc::new(RefCell::new(Vec::new())),
            in_flight: Rc::new(Cell::new(0)),
            initialized: false,
            last_time: Instant::now(),
        }
    }

    pub fn flow(&self) -> &F {
        &self.flow
    }

    pub fn flow_mut(&mut self) -> &mut F {
        &mut self.flow
    }

    /// Number of futures that have not resolved yet.
    pub fn pending(&self) -> usize {
        self.in_flight.get()
    }

    pub fn init(&mut self) {
        if self.initialized {
            log::warn!("session is already initialized");
            return;
        }
        self.initialized = true;
        let out = self.flow.on_init();
        self.handle_flow_output(out);
        self.last_time = Instant::now();
    }

    /// Runs one frame with the given `dt`.
    pub fn frame(&mut self, dt: Duration) {
        if !self.initialized {
            log::warn!("frame requested before init; ignoring");
            return;
        }
        self.poll();
        let out = self.flow.on_update(dt);
        self.handle_flow_output(out);
    }

    /// Runs one frame, measuring `dt` since the previous call.
    pub fn tick(&mut self) {
        let dt = self.last_time.elapsed();
        self.last_time = Instant::now();
        self.frame(dt);
    }

    fn poll(&mut self) {
        #[cfg(not(target_arch = "wasm32"))]
        self.pool.run_until_stalled();
        let resolved: Vec<Mutation<F>> = self.completed.borrow_mut().drain(..).collect();
        for mutation in resolved {
            mutation(&mut self.flow);
        }
    }

    fn handle_flow_output(&mut self, out: Out<F>) {
        match out {
            Out::FutFn(futures) => {
                for fut in futures {
                    let completed = self.completed.clone();
                    let in_flight = self.in_flight.clone();
                    in_flight.set(in_flight.get() + 1);
                    let task = async move {
                        let mutation = fut.await;
                        in_flight.set(in_flight.get() - 1);
                        completed.borrow_mut().push(mutation);
                    };

                    #[cfg(not(target_arch = "wasm32"))]
                    if let Err(e) = self.pool.spawner().spawn_local(task) {
                        self.in_flight.set(self.in_flight.get() - 1);
                        log::error!("could not schedule flow future: {}", e);
                    }

                    #[cfg(target_arch = "wasm32")]
                    wasm_bindgen_futures::spawn_local(task);
                }
            }
            Out::Empty => (),
        }
    }
}

/// Installs the platform logger. Safe to call more than once.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            log::debug!("logger already initialized: {}", e);
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            log::debug!("logger already initialized: {}", e);
        }
    }
}
