use std::{cell::RefCell, fmt, rc::Rc};

/// Anything that advances with the host's frame loop.
pub trait Tickable {
    /// `seconds` is host time since start, `delta_time` the seconds elapsed
    /// since the previous frame (may be 0 on the first frame) and
    /// `frame_count` a monotonically increasing frame counter.
    fn tick(&mut self, seconds: f64, delta_time: f64, frame_count: u64);
}

/// Shared handle under which a component is registered with a [`Clock`].
pub type Subscriber = Rc<RefCell<dyn Tickable>>;

/// Wraps a component in the shared handle the [`Clock`] and the host both
/// keep a reference to.
pub fn shared<T: Tickable>(component: T) -> Rc<RefCell<T>> {
    Rc::new(RefCell::new(component))
}

/// Per-frame ticker that broadcasts elapsed time to its subscribers.
///
/// Membership is keyed by handle identity: two distinct handles to equal
/// components are two subscribers, and toggling a handle only ever affects
/// that exact instance.
///
/// A disabled clock ignores [`Clock::tick`] and [`Clock::advance`] entirely,
/// pausing every subscriber at once without touching the subscriber set.
pub struct Clock {
    subscribers: Vec<Subscriber>,
    enabled: bool,
    seconds: f64,
    frame_count: u64,
}

impl Default for Clock {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
            enabled: true,
            seconds: 0.0,
            frame_count: 0,
        }
    }
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every given subscriber. Already registered ones are skipped.
    pub fn add<I>(&mut self, subscribers: I)
    where
        I: IntoIterator<Item = Subscriber>,
    {
        for subscriber in subscribers {
            if self.position(&subscriber).is_none() {
                self.subscribers.push(subscriber);
            }
        }
        tracing::debug!(count = self.subscribers.len(), "clock subscribers added");
    }

    /// Unregisters every given subscriber. Unknown ones are skipped.
    pub fn remove<I>(&mut self, subscribers: I)
    where
        I: IntoIterator<Item = Subscriber>,
    {
        for subscriber in subscribers {
            if let Some(index) = self.position(&subscriber) {
                self.subscribers.swap_remove(index);
            }
        }
        tracing::debug!(count = self.subscribers.len(), "clock subscribers removed");
    }

    /// Swaps `previous` for `new` if, and only if, `previous` is registered.
    /// Returns whether the swap happened.
    pub fn replace(&mut self, previous: &Subscriber, new: Subscriber) -> bool {
        let Some(index) = self.position(previous) else {
            return false;
        };
        match self.position(&new) {
            Some(_) => {
                self.subscribers.swap_remove(index);
            }
            None => self.subscribers[index] = new,
        }
        true
    }

    /// Flips the membership of each given subscriber independently.
    pub fn toggle<I>(&mut self, subscribers: I)
    where
        I: IntoIterator<Item = Subscriber>,
    {
        for subscriber in subscribers {
            match self.position(&subscriber) {
                Some(index) => {
                    self.subscribers.swap_remove(index);
                }
                None => self.subscribers.push(subscriber),
            }
        }
    }

    pub fn contains(&self, subscriber: &Subscriber) -> bool {
        self.position(subscriber).is_some()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            tracing::debug!(enabled, "clock enabled state changed");
        }
        self.enabled = enabled;
    }

    /// Host time accumulated by [`Clock::advance`].
    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    /// Number of frames ticked through [`Clock::advance`].
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Ticks every subscriber with identical arguments. Does nothing while
    /// the clock is disabled.
    ///
    /// # Panics
    ///
    /// Panics if a subscriber is mutably borrowed elsewhere while the clock
    /// ticks.
    pub fn tick(&mut self, seconds: f64, delta_time: f64, frame_count: u64) {
        if !self.enabled {
            return;
        }
        for subscriber in &self.subscribers {
            let mut subscriber = subscriber.borrow_mut();
            subscriber.tick(seconds, delta_time, frame_count);
        }
    }

    /// Convenience for hosts without their own clock: accumulates time and a
    /// frame counter, then ticks. The first call is frame 0.
    ///
    /// While disabled neither `seconds` nor `frame_count` move, so resuming
    /// continues from the frame the clock was paused on.
    pub fn advance(&mut self, delta_time: f64) {
        if !self.enabled {
            return;
        }
        self.seconds = (self.seconds + delta_time).max(0.0);
        let frame_count = self.frame_count;
        self.tick(self.seconds, delta_time, frame_count);
        self.frame_count += 1;
    }

    fn position(&self, subscriber: &Subscriber) -> Option<usize> {
        self.subscribers
            .iter()
            .position(|candidate| same_handle(candidate, subscriber))
    }
}

fn same_handle(a: &Subscriber, b: &Subscriber) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock")
            .field("subscribers", &self.subscribers.len())
            .field("enabled", &self.enabled)
            .field("seconds", &self.seconds)
            .field("frame_count", &self.frame_count)
            .finish()
    }
}
