//! Ticket channel types and bot eligibility
//!
//! Channel types are the static option set of the `channelType` condition
//! key. They are grouped under a parent channel for display, and a bot
//! agent can only serve the subset its subtype supports.

use serde::{Deserialize, Serialize};

/// Parent channel used to group channel types in option lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelGroup {
    InApp,
    Facebook,
    Twitter,
    Instagram,
    Whatsapp,
}

impl ChannelGroup {
    pub const ALL: [ChannelGroup; 5] = [
        ChannelGroup::InApp,
        ChannelGroup::Facebook,
        ChannelGroup::Twitter,
        ChannelGroup::Instagram,
        ChannelGroup::Whatsapp,
    ];

    /// Channel types under this parent, in display order
    pub fn channels(&self) -> impl Iterator<Item = ChannelType> + '_ {
        ChannelType::ALL.into_iter().filter(move |c| c.group() == *self)
    }
}

/// Source channel of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelType {
    Sendbird,
    SendbirdJavascript,
    SendbirdIos,
    SendbirdAndroid,
    FacebookConversation,
    FacebookFeed,
    TwitterDirectMessageEvent,
    TwitterStatus,
    InstagramComment,
    InstagramDirectMessage,
    WhatsappMessage,
}

impl ChannelType {
    pub const ALL: [ChannelType; 11] = [
        ChannelType::Sendbird,
        ChannelType::SendbirdJavascript,
        ChannelType::SendbirdIos,
        ChannelType::SendbirdAndroid,
        ChannelType::FacebookConversation,
        ChannelType::FacebookFeed,
        ChannelType::TwitterDirectMessageEvent,
        ChannelType::TwitterStatus,
        ChannelType::InstagramComment,
        ChannelType::InstagramDirectMessage,
        ChannelType::WhatsappMessage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Sendbird => "SENDBIRD",
            ChannelType::SendbirdJavascript => "SENDBIRD_JAVASCRIPT",
            ChannelType::SendbirdIos => "SENDBIRD_IOS",
            ChannelType::SendbirdAndroid => "SENDBIRD_ANDROID",
            ChannelType::FacebookConversation => "FACEBOOK_CONVERSATION",
            ChannelType::FacebookFeed => "FACEBOOK_FEED",
            ChannelType::TwitterDirectMessageEvent => "TWITTER_DIRECT_MESSAGE_EVENT",
            ChannelType::TwitterStatus => "TWITTER_STATUS",
            ChannelType::InstagramComment => "INSTAGRAM_COMMENT",
            ChannelType::InstagramDirectMessage => "INSTAGRAM_DIRECT_MESSAGE",
            ChannelType::WhatsappMessage => "WHATSAPP_MESSAGE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }

    pub fn group(&self) -> ChannelGroup {
        match self {
            ChannelType::Sendbird
            | ChannelType::SendbirdJavascript
            | ChannelType::SendbirdIos
            | ChannelType::SendbirdAndroid => ChannelGroup::InApp,
            ChannelType::FacebookConversation | ChannelType::FacebookFeed => ChannelGroup::Facebook,
            ChannelType::TwitterDirectMessageEvent | ChannelType::TwitterStatus => {
                ChannelGroup::Twitter
            }
            ChannelType::InstagramComment | ChannelType::InstagramDirectMessage => {
                ChannelGroup::Instagram
            }
            ChannelType::WhatsappMessage => ChannelGroup::Whatsapp,
        }
    }

    /// Whether a bot of the given subtype can serve tickets from this channel.
    ///
    /// An unknown subtype is only allowed on channels every bot supports.
    pub fn supports_bot(&self, bot_type: Option<BotType>) -> bool {
        match bot_type {
            Some(BotType::Custom) => CUSTOM_BOT_CHANNELS.contains(self),
            Some(BotType::Faq) => FAQ_BOT_CHANNELS.contains(self),
            None => CUSTOM_BOT_CHANNELS.contains(self) && FAQ_BOT_CHANNELS.contains(self),
        }
    }
}

/// Bot agent subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BotType {
    Custom,
    Faq,
}

/// Conversational channels a custom bot can reply on
pub const CUSTOM_BOT_CHANNELS: &[ChannelType] = &[
    ChannelType::Sendbird,
    ChannelType::SendbirdJavascript,
    ChannelType::SendbirdIos,
    ChannelType::SendbirdAndroid,
    ChannelType::FacebookConversation,
    ChannelType::TwitterDirectMessageEvent,
    ChannelType::InstagramDirectMessage,
    ChannelType::WhatsappMessage,
];

/// FAQ bots only run inside the in-app messenger
pub const FAQ_BOT_CHANNELS: &[ChannelType] = &[
    ChannelType::Sendbird,
    ChannelType::SendbirdJavascript,
    ChannelType::SendbirdIos,
    ChannelType::SendbirdAndroid,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_channel_has_a_group() {
        let grouped: usize = ChannelGroup::ALL.iter().map(|g| g.channels().count()).sum();
        assert_eq!(grouped, ChannelType::ALL.len());
        assert_eq!(
            ChannelGroup::Facebook.channels().collect::<Vec<_>>(),
            vec![ChannelType::FacebookConversation, ChannelType::FacebookFeed]
        );
    }

    #[test]
    fn test_parse_round_trips_wire_names() {
        for channel in ChannelType::ALL {
            assert_eq!(ChannelType::parse(channel.as_str()), Some(channel));
        }
        assert_eq!(ChannelType::parse("FAX"), None);
    }

    #[test]
    fn test_bot_eligibility() {
        assert!(!ChannelType::FacebookFeed.supports_bot(Some(BotType::Custom)));
        assert!(ChannelType::FacebookConversation.supports_bot(Some(BotType::Custom)));
        assert!(!ChannelType::FacebookConversation.supports_bot(Some(BotType::Faq)));
        assert!(ChannelType::SendbirdIos.supports_bot(Some(BotType::Faq)));
        assert!(ChannelType::Sendbird.supports_bot(None));
        assert!(!ChannelType::WhatsappMessage.supports_bot(None));
    }
}
