//! English message catalog

use crate::domain::{
    ChannelGroup, ChannelType, ConsequentType, FieldError, MatchPolicy, Operation, Operator,
    PriorityLevel,
};
use crate::ports::{MessageCatalog, MessageKey, SystemKey};

/// Built-in English texts
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishMessages;

impl MessageCatalog for EnglishMessages {
    fn text(&self, key: &MessageKey) -> String {
        match key {
            MessageKey::SystemKey(system_key) => system_key_label(*system_key).to_string(),
            MessageKey::Operator { operator, numeric } => {
                operator_label(*operator, *numeric).to_string()
            }
            MessageKey::Channel(channel) => channel_label(*channel).to_string(),
            MessageKey::ChannelGroup(group) => channel_group_label(*group).to_string(),
            MessageKey::Priority(priority) => priority_label(*priority).to_string(),
            MessageKey::ConsequentType(consequent_type) => match consequent_type {
                ConsequentType::Group => "Team",
                ConsequentType::GroupWithBotAgent => "Team with bot agent",
                ConsequentType::Priority => "Priority",
            }
            .to_string(),
            MessageKey::ConditionPrefix { first: true, .. } => "If".to_string(),
            MessageKey::ConditionPrefix {
                policy: MatchPolicy::All,
                ..
            } => "and".to_string(),
            MessageKey::ConditionPrefix {
                policy: MatchPolicy::Any,
                ..
            } => "or".to_string(),
            MessageKey::FieldError(error) => field_error_text(error),
            MessageKey::OperationSucceeded(operation) => succeeded(*operation).to_string(),
            MessageKey::OperationFailed(operation) => failed(*operation).to_string(),
        }
    }
}

fn system_key_label(key: SystemKey) -> &'static str {
    match key {
        SystemKey::TicketGroup => "Ticket",
        SystemKey::ChannelType => "Channel type",
        SystemKey::CustomerGroup => "Customer",
        SystemKey::CustomerId => "Customer ID",
        SystemKey::CustomerName => "Customer name",
    }
}

fn operator_label(operator: Operator, numeric: bool) -> &'static str {
    match (operator, numeric) {
        (Operator::Is, true) => "is equal to",
        (Operator::Is, false) => "is",
        (Operator::IsNot, true) => "is not equal to",
        (Operator::IsNot, false) => "is not",
        (Operator::StartsWith, _) => "starts with",
        (Operator::EndsWith, _) => "ends with",
        (Operator::Contains, _) => "contains",
        (Operator::DoesNotContain, _) => "does not contain",
        (Operator::GreaterThan, _) => "is greater than",
        (Operator::LessThan, _) => "is less than",
        (Operator::IsEmpty, _) => "is empty",
        (Operator::HasAnyValue, _) => "has any value",
        (Operator::IsUnknown, _) => "is unknown",
    }
}

fn channel_label(channel: ChannelType) -> &'static str {
    match channel {
        ChannelType::Sendbird => "In-app chat",
        ChannelType::SendbirdJavascript => "Web",
        ChannelType::SendbirdIos => "iOS",
        ChannelType::SendbirdAndroid => "Android",
        ChannelType::FacebookConversation => "Conversation",
        ChannelType::FacebookFeed => "Feed",
        ChannelType::TwitterDirectMessageEvent => "Direct message",
        ChannelType::TwitterStatus => "Tweet",
        ChannelType::InstagramComment => "Comment",
        ChannelType::InstagramDirectMessage => "Direct message",
        ChannelType::WhatsappMessage => "Message",
    }
}

fn channel_group_label(group: ChannelGroup) -> &'static str {
    match group {
        ChannelGroup::InApp => "In-app",
        ChannelGroup::Facebook => "Facebook",
        ChannelGroup::Twitter => "Twitter",
        ChannelGroup::Instagram => "Instagram",
        ChannelGroup::Whatsapp => "WhatsApp",
    }
}

fn priority_label(priority: PriorityLevel) -> &'static str {
    match priority {
        PriorityLevel::Urgent => "Urgent",
        PriorityLevel::High => "High",
        PriorityLevel::Medium => "Medium",
        PriorityLevel::Low => "Low",
    }
}

fn field_error_text(error: &FieldError) -> String {
    match error {
        FieldError::Required => "This field is required.".to_string(),
        FieldError::TooLong { max } => format!("Enter {} characters or fewer.", max),
        FieldError::DigitsOnly => "Only numbers are allowed.".to_string(),
        FieldError::NotAnOption => "Select one of the available options.".to_string(),
        FieldError::OperatorNotAllowed => {
            "This operator can't be used with the selected key.".to_string()
        }
        FieldError::UnknownKey => "This key is no longer available.".to_string(),
        FieldError::UnsupportedByCustomBot => {
            "Custom bots can't reply on this channel.".to_string()
        }
        FieldError::UnsupportedByFaqBot => "FAQ bots only reply on in-app channels.".to_string(),
        FieldError::UnsupportedByBot => {
            "The selected bot may not be able to reply on this channel.".to_string()
        }
        FieldError::AgentNotInGroup => "This bot is not a member of the selected team.".to_string(),
        FieldError::TooFewConditions { min } => match min {
            1 => "Add at least one condition.".to_string(),
            n => format!("Add at least {} conditions.", n),
        },
        FieldError::TooManyConditions { max } => {
            format!("A rule can have up to {} conditions.", max)
        }
        FieldError::Server { reason } => reason.clone(),
    }
}

fn succeeded(operation: Operation) -> &'static str {
    match operation {
        Operation::FetchRules => "Rules loaded.",
        Operation::FetchRule => "Rule loaded.",
        Operation::FetchCustomFields => "Custom fields loaded.",
        Operation::FetchAgents => "Agents loaded.",
        Operation::CreateRule => "Rule created.",
        Operation::UpdateRule => "Rule saved.",
        Operation::DeleteRule => "Rule deleted.",
        Operation::ToggleStatus => "Rule status changed.",
        Operation::SaveOrder => "Rule order saved.",
    }
}

fn failed(operation: Operation) -> &'static str {
    match operation {
        Operation::FetchRules => "Couldn't load rules.",
        Operation::FetchRule => "Couldn't load the rule.",
        Operation::FetchCustomFields => "Couldn't load custom fields.",
        Operation::FetchAgents => "Couldn't load agent details.",
        Operation::CreateRule => "Couldn't create the rule.",
        Operation::UpdateRule => "Couldn't save the rule.",
        Operation::DeleteRule => "Couldn't delete the rule.",
        Operation::ToggleStatus => "Couldn't change the rule status.",
        Operation::SaveOrder => "Couldn't save the rule order.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConditionType;

    #[test]
    fn test_numeric_phrasing() {
        let messages = EnglishMessages;
        assert_eq!(messages.operator_label(Operator::Is, ConditionType::Number), "is equal to");
        assert_eq!(messages.operator_label(Operator::Is, ConditionType::Text), "is");
        assert_eq!(
            messages.operator_label(Operator::GreaterThan, ConditionType::Number),
            "is greater than"
        );
    }

    #[test]
    fn test_condition_prefix() {
        let messages = EnglishMessages;
        assert_eq!(messages.condition_prefix(0, MatchPolicy::Any), "If");
        assert_eq!(messages.condition_prefix(1, MatchPolicy::All), "and");
        assert_eq!(messages.condition_prefix(2, MatchPolicy::Any), "or");
    }

    #[test]
    fn test_server_reason_is_passed_through() {
        let messages = EnglishMessages;
        let text = messages.field_error(&FieldError::Server {
            reason: "Field was deleted".to_string(),
        });
        assert_eq!(text, "Field was deleted");
    }
}
