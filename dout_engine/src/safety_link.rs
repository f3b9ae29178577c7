//! Safety-link resolution between high-side and low-side outputs.
//!
//! A safety-relevant load is switched by a high-side and a low-side stage
//! in series. Each end that names a partner records a link; a channel can
//! take part in at most one pair.

use serde::{Deserialize, Serialize};

use dout_common::channel::{ChannelCaps, ChannelDescriptor, ChannelId, GroupProfiles};
use dout_common::config::GlobalSafetyConfig;
use dout_common::consts::MAX_CHANNELS;
use dout_common::error::DoutError;

use crate::registry::ChannelRegistry;

/// Per-channel safety configuration supplied at output initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SafetyLinkConfig {
    /// Opposite-polarity partner output.
    pub partner: ChannelId,
}

/// Recorded links, keyed by the channel that declared them.
#[derive(Debug, Clone)]
pub struct SafetyLinkResolver {
    links: [Option<ChannelId>; MAX_CHANNELS],
}

impl Default for SafetyLinkResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyLinkResolver {
    pub const fn new() -> Self {
        Self {
            links: [None; MAX_CHANNELS],
        }
    }

    /// Check the safety configuration of an output about to be initialised.
    ///
    /// Returns the validated partner, or `None` for a channel without a link.
    pub fn resolve(
        &self,
        registry: &ChannelRegistry,
        profiles: &GroupProfiles,
        global: Option<&GlobalSafetyConfig>,
        desc: &ChannelDescriptor,
        link: Option<&SafetyLinkConfig>,
    ) -> Result<Option<ChannelId>, DoutError> {
        let relevant = desc.has(ChannelCaps::SAFETY_RELEVANT);
        if relevant && global.is_none() {
            return Err(DoutError::SafetyConfigMissing);
        }

        let Some(link) = link else {
            if relevant && global.is_some_and(|g| g.require_link) {
                return Err(DoutError::InvalidSafetyConfig);
            }
            return Ok(None);
        };

        if !desc.has(ChannelCaps::SAFETY_LINK) || link.partner == desc.id {
            return Err(DoutError::InvalidSafetyConfig);
        }
        let partner = registry
            .descriptor(link.partner)
            .map_err(|_| DoutError::InvalidSafetyConfig)?;
        if !partner.is_output()
            || !partner.has(ChannelCaps::SAFETY_LINK)
            || partner.shutoff_group != desc.shutoff_group
            || profiles.get(partner.group).polarity == profiles.get(desc.group).polarity
        {
            return Err(DoutError::InvalidSafetyConfig);
        }

        // Partner already paired with someone else, in either direction.
        if let Some(existing) = self.links[partner.id as usize]
            && existing != desc.id
        {
            return Err(DoutError::InvalidSafetyConfig);
        }
        if self.declared_by_other(partner.id, desc.id) {
            return Err(DoutError::InvalidSafetyConfig);
        }
        if self.declared_by_other(desc.id, partner.id) {
            return Err(DoutError::InvalidSafetyConfig);
        }

        Ok(Some(partner.id))
    }

    fn declared_by_other(&self, target: ChannelId, allowed: ChannelId) -> bool {
        self.links
            .iter()
            .enumerate()
            .any(|(owner, link)| *link == Some(target) && owner != allowed as usize)
    }

    pub fn record(&mut self, owner: ChannelId, partner: ChannelId) {
        if let Some(slot) = self.links.get_mut(owner as usize) {
            *slot = Some(partner);
        }
    }

    /// Drop the link declared by `owner`.
    pub fn release(&mut self, owner: ChannelId) -> Option<ChannelId> {
        self.links.get_mut(owner as usize).and_then(Option::take)
    }

    /// Partner of `id`, whichever end declared the link.
    pub fn partner_of(&self, id: ChannelId) -> Option<ChannelId> {
        if let Some(partner) = self.links.get(id as usize).copied().flatten() {
            return Some(partner);
        }
        self.links
            .iter()
            .position(|link| *link == Some(id))
            .map(|owner| owner as ChannelId)
    }
}
