//! Demo workspace seed data
//!
//! A small help desk: three teams, a handful of agents (two of them bots),
//! ticket and customer custom fields, and a few rules of each type. One
//! rule still references a custom field that has since been deleted, so
//! it carries a stored server error.

use chrono::{Duration, Utc};

use crate::domain::{
    Agent, AgentGroup, AgentType, BotType, Condition, ConditionErrorType, ConditionType,
    Conditional, Consequent, CustomField, CustomFieldType, MatchPolicy, Operator, PriorityLevel,
    Rule, RuleError, RuleStatus, RuleType,
};

use super::workspace::WorkspaceData;

pub const SUPPORT_TEAM: i64 = 1;
pub const BILLING_TEAM: i64 = 2;
pub const SOCIAL_TEAM: i64 = 3;
pub const CUSTOM_BOT: i64 = 501;
pub const FAQ_BOT: i64 = 502;

/// Seed contents of `demo.json`
pub fn demo_workspace() -> WorkspaceData {
    let rules = demo_rules();
    WorkspaceData {
        next_rule_id: rules.iter().map(|r| r.id).max().unwrap_or(0),
        rules,
        ticket_fields: vec![
            CustomField::new("plan", "Plan", CustomFieldType::Dropdown)
                .with_options(["free", "starter", "business", "enterprise"]),
            CustomField::new("orderCount", "Order count", CustomFieldType::Integer),
            CustomField::new("orderNumber", "Order number", CustomFieldType::String),
            CustomField::new("invoiceUrl", "Invoice", CustomFieldType::Link),
        ],
        customer_fields: vec![
            CustomField::new("company", "Company", CustomFieldType::String),
            CustomField::new("region", "Region", CustomFieldType::Dropdown)
                .with_options(["americas", "emea", "apac"]),
        ],
        groups: vec![
            group(SUPPORT_TEAM, "Support", "support"),
            group(BILLING_TEAM, "Billing", "billing"),
            group(SOCIAL_TEAM, "Social media", "social"),
        ],
        agents: vec![
            Agent {
                id: 101,
                display_name: "Maya Chen".to_string(),
                agent_type: AgentType::User,
                bot_type: None,
                group_ids: vec![SUPPORT_TEAM, BILLING_TEAM],
            },
            Agent {
                id: 102,
                display_name: "Jonas Berg".to_string(),
                agent_type: AgentType::User,
                bot_type: None,
                group_ids: vec![SOCIAL_TEAM],
            },
            Agent {
                id: CUSTOM_BOT,
                display_name: "Order Assistant".to_string(),
                agent_type: AgentType::Bot,
                bot_type: Some(BotType::Custom),
                group_ids: vec![SUPPORT_TEAM, SOCIAL_TEAM],
            },
            Agent {
                id: FAQ_BOT,
                display_name: "Help Center Bot".to_string(),
                agent_type: AgentType::Bot,
                bot_type: Some(BotType::Faq),
                group_ids: vec![SUPPORT_TEAM],
            },
        ],
    }
}

fn group(id: i64, name: &str, key: &str) -> AgentGroup {
    AgentGroup {
        id,
        name: name.to_string(),
        key: Some(key.to_string()),
    }
}

fn condition(key: &str, condition_type: ConditionType, operator: Operator, value: Option<&str>) -> Condition {
    Condition::new(key, condition_type, operator, value.map(str::to_string))
}

fn demo_rules() -> Vec<Rule> {
    let created = Utc::now() - Duration::days(30);
    let rule = |id, name: &str, rule_type, order, match_policy, conditions, consequent| Rule {
        id,
        name: name.to_string(),
        rule_type,
        status: RuleStatus::On,
        order,
        conditional: Conditional {
            match_policy,
            conditions,
            consequent,
        },
        error: None,
        created_at: Some(created),
        updated_at: Some(created),
    };

    let mut legacy = rule(
        4,
        "Legacy VIP accounts",
        RuleType::Assignment,
        3,
        MatchPolicy::All,
        vec![
            condition("ticket.customFields.vipTier", ConditionType::Dropdown, Operator::Is, Some("gold")),
            condition("customer.customFields.company", ConditionType::Text, Operator::HasAnyValue, None),
        ],
        Consequent::Group { group: BILLING_TEAM },
    );
    legacy.status = RuleStatus::Off;
    legacy.error = Some(RuleError::default().with_condition(
        0,
        ConditionErrorType::Key,
        "This custom field was deleted",
    ));

    vec![
        rule(
            1,
            "Enterprise billing",
            RuleType::Assignment,
            1,
            MatchPolicy::All,
            vec![
                condition("ticket.customFields.plan", ConditionType::Dropdown, Operator::Is, Some("enterprise")),
                condition("ticket.customFields.orderCount", ConditionType::Number, Operator::GreaterThan, Some("10")),
            ],
            Consequent::Group { group: BILLING_TEAM },
        ),
        rule(
            2,
            "Order questions in chat",
            RuleType::Assignment,
            2,
            MatchPolicy::Any,
            vec![
                condition("channelType", ConditionType::Dropdown, Operator::Is, Some("SENDBIRD_IOS")),
                condition("channelType", ConditionType::Dropdown, Operator::Is, Some("WHATSAPP_MESSAGE")),
            ],
            Consequent::GroupWithBotAgent {
                group: SUPPORT_TEAM,
                agent: CUSTOM_BOT,
            },
        ),
        legacy,
        rule(
            3,
            "Public posts",
            RuleType::Assignment,
            4,
            MatchPolicy::Any,
            vec![
                condition("channelType", ConditionType::Dropdown, Operator::Is, Some("FACEBOOK_FEED")),
                condition("channelType", ConditionType::Dropdown, Operator::Is, Some("TWITTER_STATUS")),
                condition("channelType", ConditionType::Dropdown, Operator::Is, Some("INSTAGRAM_COMMENT")),
            ],
            Consequent::Group { group: SOCIAL_TEAM },
        ),
        rule(
            5,
            "Urgent for enterprise",
            RuleType::Priority,
            1,
            MatchPolicy::All,
            vec![condition("ticket.customFields.plan", ConditionType::Dropdown, Operator::Is, Some("enterprise"))],
            Consequent::Priority {
                priority: PriorityLevel::Urgent,
            },
        ),
        rule(
            6,
            "Low for anonymous visitors",
            RuleType::Priority,
            2,
            MatchPolicy::All,
            vec![condition("customerId", ConditionType::Text, Operator::IsUnknown, None)],
            Consequent::Priority {
                priority: PriorityLevel::Low,
            },
        ),
    ]
}
