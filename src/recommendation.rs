//! Collection and recovery recommendations per risk tier.
//!
//! The content is policy text authored by the collections team, not
//! something computed, so it is a static lookup keyed by tier.

use crate::types::assessment::RiskTier;
use serde::Serialize;

/// Action plan attached to every assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub risk_level: RiskTier,
    pub action: &'static str,
    pub priority: &'static str,
    pub method: &'static str,
    pub timeline: &'static str,
    pub details: &'static str,
    /// Ordered instructions for the collections agent
    pub next_steps: &'static [&'static str],
}

const LOW: Recommendation = Recommendation {
    risk_level: RiskTier::Low,
    action: "Send standard payment reminder",
    priority: "Normal",
    method: "Automated SMS/Email",
    timeline: "Standard schedule",
    details: "Borrower shows good repayment capability. Continue regular monitoring with automated reminders.",
    next_steps: &[
        "Send automated payment reminder 3 days before due date",
        "Continue standard monitoring",
        "Eligible for future loan considerations",
        "Maintain regular follow-up schedule",
    ],
};

const MEDIUM: Recommendation = Recommendation {
    risk_level: RiskTier::Medium,
    action: "Make personalized call to discuss the loan",
    priority: "Medium",
    method: "Personalized phone call",
    timeline: "Within 3-5 business days",
    details: "Borrower shows moderate risk. Personal engagement recommended to understand their situation and provide support.",
    next_steps: &[
        "Schedule personalized call with borrower",
        "Understand current financial situation",
        "Offer flexible payment options if needed",
        "Set up closer monitoring schedule",
        "Document conversation and commitments",
    ],
};

const HIGH: Recommendation = Recommendation {
    risk_level: RiskTier::High,
    action: "Prioritize collection efforts from borrower",
    priority: "Urgent",
    method: "Direct intervention by senior recovery agent",
    timeline: "Within 24-48 hours",
    details: "High default probability detected. Immediate action required. Consider loan restructuring or initiate recovery process.",
    next_steps: &[
        "Assign to senior recovery agent immediately",
        "Schedule urgent meeting with borrower",
        "Review collateral and guarantor details",
        "Discuss loan restructuring options",
        "Initiate recovery proceedings if necessary",
        "Escalate to management if no response",
    ],
};

impl Recommendation {
    pub fn for_tier(tier: RiskTier) -> &'static Recommendation {
        match tier {
            RiskTier::Low => &LOW,
            RiskTier::Medium => &MEDIUM,
            RiskTier::High => &HIGH,
        }
    }
}
