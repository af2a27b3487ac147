//! Contiguous chain of placed segments along the run axis.

use std::collections::VecDeque;

use glam::Vec3;
use lane_runner_core::{SegmentId, TemplateId, LANE_AXIS, RUN_AXIS};

use crate::pool::PoolHandle;

/// Scalar progress of a point along the run axis.
pub(crate) fn run_distance(point: Vec3) -> f32 {
    point.dot(RUN_AXIS)
}

/// Bookkeeping for one segment that is part of the chain.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ChainLink {
    pub(crate) segment: SegmentId,
    pub(crate) template: TemplateId,
    pub(crate) handle: PoolHandle,
    pub(crate) start: Vec3,
    pub(crate) end: Vec3,
}

/// Ordered segments where every end anchor equals the next start anchor.
#[derive(Debug)]
pub(crate) struct LevelChain {
    origin: Vec3,
    leading_edge: Vec3,
    links: VecDeque<ChainLink>,
}

impl LevelChain {
    pub(crate) fn new(origin: Vec3) -> Self {
        Self {
            origin,
            leading_edge: origin,
            links: VecDeque::new(),
        }
    }

    pub(crate) fn origin(&self) -> Vec3 {
        self.origin
    }

    pub(crate) fn leading_edge(&self) -> Vec3 {
        self.leading_edge
    }

    pub(crate) fn links(&self) -> impl Iterator<Item = &ChainLink> {
        self.links.iter()
    }

    /// Appends a link that starts at the current leading edge.
    pub(crate) fn append(&mut self, link: ChainLink) {
        debug_assert_eq!(link.start, self.leading_edge, "chain must stay contiguous");
        self.leading_edge = link.end;
        self.links.push_back(link);
    }

    /// Removes the rearmost link once its end anchor trails `position` by more than `retention`.
    pub(crate) fn pop_trailing(&mut self, position: Vec3, retention: f32) -> Option<ChainLink> {
        let front = self.links.front()?;
        if run_distance(position) - run_distance(front.end) > retention {
            self.links.pop_front()
        } else {
            None
        }
    }

    /// Empties the chain and rewinds the leading edge to the origin.
    pub(crate) fn reset(&mut self) -> Vec<ChainLink> {
        self.leading_edge = self.origin;
        self.links.drain(..).collect()
    }

    /// Finds the link whose surface lies under `position`, within `half_width` across lanes.
    pub(crate) fn link_under(&self, position: Vec3, half_width: f32) -> Option<&ChainLink> {
        if position.dot(LANE_AXIS).abs() > half_width {
            return None;
        }

        let along = run_distance(position);
        self.links
            .iter()
            .find(|link| along >= run_distance(link.start) && along <= run_distance(link.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: u32, start: Vec3, length: f32) -> ChainLink {
        ChainLink {
            segment: SegmentId::new(id),
            template: TemplateId::new(0),
            handle: PoolHandle::from_index(id as usize),
            start,
            end: start + RUN_AXIS * length,
        }
    }

    #[test]
    fn append_advances_leading_edge() {
        let mut chain = LevelChain::new(Vec3::ZERO);
        chain.append(link(0, Vec3::ZERO, 10.0));
        let edge = chain.leading_edge();
        chain.append(link(1, edge, 5.0));

        assert_eq!(chain.leading_edge(), RUN_AXIS * 15.0);
        let links: Vec<_> = chain.links().collect();
        assert_eq!(links[0].end, links[1].start);
    }

    #[test]
    fn trailing_link_is_released_past_retention() {
        let mut chain = LevelChain::new(Vec3::ZERO);
        chain.append(link(0, Vec3::ZERO, 10.0));
        let edge = chain.leading_edge();
        chain.append(link(1, edge, 10.0));

        assert!(chain.pop_trailing(RUN_AXIS * 12.0, 5.0).is_none());
        let popped = chain.pop_trailing(RUN_AXIS * 16.0, 5.0).expect("first link trails");
        assert_eq!(popped.segment, SegmentId::new(0));
        assert_eq!(chain.leading_edge(), RUN_AXIS * 20.0);
    }

    #[test]
    fn reset_returns_every_link_and_rewinds() {
        let origin = Vec3::new(3.0, 0.0, 0.0);
        let mut chain = LevelChain::new(origin);
        chain.append(link(0, origin, 10.0));

        assert_eq!(chain.reset().len(), 1);
        assert_eq!(chain.leading_edge(), origin);
        assert_eq!(chain.links().count(), 0);
    }

    #[test]
    fn surface_lookup_respects_lane_width() {
        let mut chain = LevelChain::new(Vec3::ZERO);
        chain.append(link(0, Vec3::ZERO, 10.0));
        let inside = RUN_AXIS * 4.0 + LANE_AXIS * 2.0;
        let outside = RUN_AXIS * 4.0 + LANE_AXIS * 4.0;

        assert!(chain.link_under(inside, 3.75).is_some());
        assert!(chain.link_under(outside, 3.75).is_none());
        assert!(chain.link_under(RUN_AXIS * 11.0, 3.75).is_none());
    }
}
