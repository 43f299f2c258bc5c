// This file is part of krusty, a POSIX-like command shell.
// Copyright (C) 2026 the krusty contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Hook manager: lifecycle events fired to subscribers in
//! definition order, one hook fully run before the next in the same event
//! class starts.

use std::collections::HashMap;
use std::path::PathBuf;

/// A lifecycle event a hook can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Startup,
    PreCommand,
    PostCommand,
    DirectoryChanged,
    JobDone,
    Shutdown,
}

/// Data passed to a hook when its event fires.
#[derive(Debug, Clone)]
pub enum Payload {
    None,
    Command(String),
    ExitCode(i32),
    Directory(PathBuf),
    Job(u32),
}

type HookFn = Box<dyn FnMut(&Payload)>;

/// Registry of hooks grouped by [`Event`], fired in subscription order.
#[derive(Default)]
pub struct HookManager {
    subscribers: HashMap<Event, Vec<HookFn>>,
}

impl HookManager {
    pub fn new() -> Self {
        HookManager::default()
    }

    /// Registers `hook` to run whenever `event` fires, after any hooks
    /// already subscribed to it.
    pub fn subscribe<F>(&mut self, event: Event, hook: F)
    where
        F: FnMut(&Payload) + 'static,
    {
        self.subscribers
            .entry(event)
            .or_default()
            .push(Box::new(hook));
    }

    /// Runs every hook subscribed to `event`, in definition order, each one
    /// to completion before the next starts.
    pub fn fire(&mut self, event: Event, payload: &Payload) {
        if let Some(hooks) = self.subscribers.get_mut(&event) {
            for hook in hooks.iter_mut() {
                hook(payload);
            }
        }
    }

    pub fn subscriber_count(&self, event: Event) -> usize {
        self.subscribers.get(&event).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for HookManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookManager")
            .field(
                "subscriber_counts",
                &self
                    .subscribers
                    .iter()
                    .map(|(k, v)| (*k, v.len()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn hooks_fire_in_definition_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut mgr = HookManager::new();
        let l1 = log.clone();
        mgr.subscribe(Event::Startup, move |_| l1.borrow_mut().push(1));
        let l2 = log.clone();
        mgr.subscribe(Event::Startup, move |_| l2.borrow_mut().push(2));
        mgr.fire(Event::Startup, &Payload::None);
        assert_eq!(*log.borrow(), vec![1, 2]);
    }

    #[test]
    fn unrelated_events_do_not_cross_fire() {
        let mut mgr = HookManager::new();
        let fired = Rc::new(RefCell::new(false));
        let f = fired.clone();
        mgr.subscribe(Event::Shutdown, move |_| *f.borrow_mut() = true);
        mgr.fire(Event::Startup, &Payload::None);
        assert!(!*fired.borrow());
        mgr.fire(Event::Shutdown, &Payload::None);
        assert!(*fired.borrow());
    }

    #[test]
    fn subscriber_count_reflects_registrations() {
        let mut mgr = HookManager::new();
        assert_eq!(mgr.subscriber_count(Event::JobDone), 0);
        mgr.subscribe(Event::JobDone, |_| {});
        mgr.subscribe(Event::JobDone, |_| {});
        assert_eq!(mgr.subscriber_count(Event::JobDone), 2);
    }

    #[test]
    fn payload_is_passed_through() {
        let mut mgr = HookManager::new();
        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();
        mgr.subscribe(Event::PostCommand, move |p| {
            if let Payload::ExitCode(code) = p {
                *s.borrow_mut() = Some(*code);
            }
        });
        mgr.fire(Event::PostCommand, &Payload::ExitCode(42));
        assert_eq!(*seen.borrow(), Some(42));
    }
}
