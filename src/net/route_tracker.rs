//! Traced-route bookkeeping.
//!
//! Clients report the hop list of every traceroute packet they receive; the
//! tracker keeps the latest one per `(src, dst)` and checks it against the
//! known-correct routes of the network description.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use super::id::Addr;
use crate::sim::SimTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracedRoute {
    pub route: Vec<Addr>,
    pub correct: bool,
    pub at: SimTime,
}

#[derive(Debug, Default)]
pub struct RouteTracker {
    correct: HashMap<(Addr, Addr), Vec<Vec<Addr>>>,
    routes: BTreeMap<(Addr, Addr), TracedRoute>,
}

impl RouteTracker {
    /// Register an acceptable route; its first and last hops name the pair.
    pub fn add_correct_route(&mut self, route: Vec<Addr>) {
        let (Some(src), Some(dst)) = (route.first(), route.last()) else {
            return;
        };
        self.correct
            .entry((src.clone(), dst.clone()))
            .or_default()
            .push(route);
    }

    /// Record a traced route unless a newer one is already on file.
    pub fn update(&mut self, src: Addr, dst: Addr, route: Vec<Addr>, now: SimTime) {
        let key = (src, dst);
        if self.routes.get(&key).is_some_and(|r| r.at > now) {
            return;
        }
        let correct = self
            .correct
            .get(&key)
            .is_some_and(|good| good.contains(&route));
        self.routes.insert(
            key,
            TracedRoute {
                route,
                correct,
                at: now,
            },
        );
    }

    pub fn get(&self, src: &Addr, dst: &Addr) -> Option<&TracedRoute> {
        self.routes.get(&(src.clone(), dst.clone()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn reset(&mut self) {
        self.routes.clear();
    }

    pub fn all_correct(&self) -> bool {
        !self.routes.is_empty() && self.routes.values().all(|r| r.correct)
    }

    /// One sorted line per pair, plus a final verdict line when everything matched.
    pub fn report(&self, label_incorrect: bool) -> String {
        let mut out = String::new();
        for ((src, dst), traced) in &self.routes {
            let hops: Vec<&str> = traced.route.iter().map(Addr::as_str).collect();
            let _ = write!(out, "{src} -> {dst}: [{}]", hops.join(", "));
            if label_incorrect && !traced.correct && !traced.route.is_empty() {
                out.push_str(" Incorrect Route");
            }
            out.push('\n');
        }
        if self.all_correct() {
            out.push_str("ALL ROUTES CORRECT!\n");
        }
        out
    }
}
