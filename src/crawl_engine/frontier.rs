//! Crawl frontier: the to-visit queue plus the visited set.
//!
//! The frontier enforces the invariants the crawl's termination proof rests
//! on: a URL enters `visited` at most once, nothing already visited or
//! queued is re-enqueued, and only same-origin URLs are accepted. With a
//! finite link graph the queue therefore drains to empty and the crawl
//! cannot revisit or deadlock.

use std::collections::{HashSet, VecDeque};
use url::Url;

#[derive(Debug)]
pub struct Frontier {
    origin_host: String,
    origin_port: Option<u16>,
    visited: HashSet<String>,
    queued: HashSet<String>,
    queue: VecDeque<Url>,
}

impl Frontier {
    /// Create a frontier seeded with the base URL.
    #[must_use]
    pub fn new(base: &Url) -> Self {
        let mut frontier = Self {
            origin_host: base.host_str().unwrap_or_default().to_string(),
            origin_port: base.port(),
            visited: HashSet::new(),
            queued: HashSet::new(),
            queue: VecDeque::new(),
        };
        frontier.queued.insert(identity_key(base));
        frontier.queue.push_back(base.clone());
        frontier
    }

    /// Pop the next URL in FIFO (breadth-first) order.
    pub fn pop(&mut self) -> Option<Url> {
        let url = self.queue.pop_front()?;
        self.queued.remove(&identity_key(&url));
        Some(url)
    }

    /// Whether a page URL shares the crawl's origin (host and explicit port).
    #[must_use]
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.host_str() == Some(self.origin_host.as_str()) && url.port() == self.origin_port
    }

    #[must_use]
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(&identity_key(url))
    }

    pub fn mark_visited(&mut self, url: &Url) {
        self.visited.insert(identity_key(url));
    }

    /// Enqueue a URL if it is same-origin, unvisited, and not already queued.
    ///
    /// Returns whether the URL was accepted.
    pub fn enqueue(&mut self, url: Url) -> bool {
        if !self.is_same_origin(&url) {
            return false;
        }
        let key = identity_key(&url);
        if self.visited.contains(&key) || self.queued.contains(&key) {
            return false;
        }
        self.queued.insert(key);
        self.queue.push_back(url);
        true
    }

    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

/// Identity used for visited/queued membership: the URL minus its fragment,
/// so `/page#top` and `/page` count as one page.
fn identity_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://site.example/").unwrap()
    }

    #[test]
    fn seeds_with_the_base_url() {
        let mut frontier = Frontier::new(&base());
        assert_eq!(frontier.pop().unwrap(), base());
        assert!(frontier.is_drained());
    }

    #[test]
    fn rejects_cross_origin_urls() {
        let mut frontier = Frontier::new(&base());
        assert!(!frontier.enqueue(Url::parse("https://other.example/x").unwrap()));
        // Different port on the same host is a different origin.
        assert!(!frontier.enqueue(Url::parse("https://site.example:8443/x").unwrap()));
    }

    #[test]
    fn never_re_enqueues_visited_or_queued() {
        let mut frontier = Frontier::new(&base());
        let page = Url::parse("https://site.example/about").unwrap();
        assert!(frontier.enqueue(page.clone()));
        assert!(!frontier.enqueue(page.clone()), "already queued");

        let popped = frontier.pop().unwrap(); // base
        frontier.mark_visited(&popped);
        let popped = frontier.pop().unwrap(); // about
        frontier.mark_visited(&popped);
        assert!(!frontier.enqueue(page), "already visited");
        assert!(frontier.is_drained());
    }

    #[test]
    fn fragments_do_not_create_new_pages() {
        let mut frontier = Frontier::new(&base());
        assert!(frontier.enqueue(Url::parse("https://site.example/a#one").unwrap()));
        assert!(!frontier.enqueue(Url::parse("https://site.example/a#two").unwrap()));
    }
}
