//! Terminal front end for the onboarding wizard.
//!
//! Renders the current step's form on stdout, reads answers from stdin, and
//! drives the controller. Validation and submission errors are shown inline
//! and never clear what the user already typed: drafts live in the session,
//! so a failed step re-renders with its values as defaults.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::api::types::{
    BehavioralData, CheckFrequency, DecisionStyle, Demographics, KycDocumentType, KycUpload,
    LossReaction, PersonalInfo,
};
use crate::error::{ApiError, WizardError};
use crate::wizard::{Advance, StepPayload, WizardController, WizardSession, WizardStep};

/// Navigation commands accepted at any prompt.
enum Input {
    /// A value, or `None` when the user just pressed Enter.
    Value(Option<String>),
    Back,
    Skip,
    Quit,
}

/// What to do after a step's form was collected.
enum Action {
    Advance,
    Back,
    Skip,
    Quit,
}

pub struct WizardCli {
    controller: Arc<WizardController>,
    lines: Lines<BufReader<Stdin>>,
    user_id: i64,
}

impl WizardCli {
    pub fn new(controller: Arc<WizardController>, user_id: i64) -> Self {
        Self {
            controller,
            lines: BufReader::new(tokio::io::stdin()).lines(),
            user_id,
        }
    }

    /// Run the wizard until completion, quit, or forced re-login.
    pub async fn run(mut self) -> anyhow::Result<()> {
        loop {
            if self.controller.is_complete().await {
                return Ok(());
            }
            let session = self.controller.snapshot().await;
            render_header(&session);

            if session.current == WizardStep::Completion {
                render_summary(&session);
                self.controller.complete().await?;
                println!("You're all set. Welcome aboard!");
                return Ok(());
            }

            if let Some(error) = &session.last_error {
                println!("⚠️  Last attempt failed: {error}");
            }

            let action = self.collect(&session).await?;
            match action {
                Action::Quit => {
                    println!("Progress saved. Run again to resume where you left off.");
                    return Ok(());
                }
                Action::Back => match self.controller.retreat().await {
                    Ok(_) | Err(WizardError::AtFirstStep) => continue,
                    Err(e) => return Err(e.into()),
                },
                Action::Skip => match self.controller.skip().await {
                    Ok(_) => continue,
                    Err(WizardError::StepNotSkippable(step)) => {
                        println!("Step {} cannot be skipped.", step.number());
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                },
                Action::Advance => {}
            }

            match self.controller.advance().await {
                Ok(Advance::Moved(_)) => {
                    render_acknowledgment(session.current, &self.controller.snapshot().await);
                }
                Ok(Advance::Stale) => {}
                Err(WizardError::Validation(errors)) => {
                    println!("Please fix the following and try again:");
                    for error in &errors.errors {
                        println!("  ✗ {}: {}", error.field, error.message);
                    }
                }
                Err(WizardError::Submission(ApiError::AuthExpired)) => {
                    println!("Your session expired. Progress is saved; please log in again.");
                    return Ok(());
                }
                Err(WizardError::Submission(e)) => println!("  ✗ {e}"),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Collect the current step's form into a session draft.
    async fn collect(&mut self, session: &WizardSession) -> anyhow::Result<Action> {
        match session.current {
            WizardStep::PersonalInfo => self.collect_personal_info(session).await,
            WizardStep::MobileVerification => {
                println!("Mobile verification is optional. You can verify later.");
                self.confirm("Press Enter to continue (/skip, /back, /quit)")
                    .await
            }
            WizardStep::KycUpload => self.collect_kyc(session).await,
            WizardStep::Questionnaire => {
                println!("Your answers determine the Q-score of your risk profile.");
                println!("The standard answer set will be submitted for you.");
                self.confirm("Press Enter to submit (/back, /quit)").await
            }
            WizardStep::Demographics => self.collect_demographics(session).await,
            WizardStep::Behavioral => self.collect_behavioral(session).await,
            WizardStep::Calculate => {
                println!("Ready to combine your Q-, G- and B-scores into a risk profile.");
                self.confirm("Press Enter to calculate (/back, /quit)").await
            }
            WizardStep::Completion => Ok(Action::Advance),
        }
    }

    async fn collect_personal_info(&mut self, session: &WizardSession) -> anyhow::Result<Action> {
        let draft = match session.payload(WizardStep::PersonalInfo) {
            Some(StepPayload::PersonalInfo(info)) => info.clone(),
            _ => PersonalInfo::default(),
        };

        let first_name = match self.field("First name", nonempty(&draft.first_name)).await? {
            Input::Value(v) => v.unwrap_or(draft.first_name),
            other => return Ok(nav(other)),
        };
        let last_name = match self.field("Last name", nonempty(&draft.last_name)).await? {
            Input::Value(v) => v.unwrap_or(draft.last_name),
            other => return Ok(nav(other)),
        };
        let phone = match self.field("Phone (optional)", draft.phone.as_deref()).await? {
            Input::Value(v) => v.or(draft.phone).filter(|p| !p.is_empty()),
            other => return Ok(nav(other)),
        };

        self.controller
            .enter_draft(StepPayload::PersonalInfo(PersonalInfo {
                first_name,
                last_name,
                phone,
            }))
            .await?;
        Ok(Action::Advance)
    }

    async fn collect_kyc(&mut self, session: &WizardSession) -> anyhow::Result<Action> {
        let draft = match session.payload(WizardStep::KycUpload) {
            Some(StepPayload::KycUpload(upload)) => Some(upload.clone()),
            _ => None,
        };

        println!("Attach a KYC document reference, or leave empty to skip for now.");
        let url = match self
            .field(
                "Document URL",
                draft.as_ref().map(|d| d.document_url.as_str()),
            )
            .await?
        {
            Input::Value(v) => v.or(draft.as_ref().map(|d| d.document_url.clone())),
            other => return Ok(nav(other)),
        };
        let Some(url) = url.filter(|u| !u.is_empty()) else {
            // Nothing attached: the step's policy turns this into a local
            // advance.
            return Ok(Action::Advance);
        };

        let document_type = match self
            .field("Document type [aadhaar/pan/bank_statement]", Some("pan"))
            .await?
        {
            Input::Value(v) => match v.as_deref() {
                Some("aadhaar") => KycDocumentType::Aadhaar,
                Some("bank_statement") => KycDocumentType::BankStatement,
                _ => KycDocumentType::Pan,
            },
            other => return Ok(nav(other)),
        };

        self.controller
            .enter_draft(StepPayload::KycUpload(KycUpload {
                user_id: self.user_id,
                document_type,
                document_url: url,
            }))
            .await?;
        Ok(Action::Advance)
    }

    async fn collect_demographics(&mut self, session: &WizardSession) -> anyhow::Result<Action> {
        let draft = match session.payload(WizardStep::Demographics) {
            Some(StepPayload::Demographics(demo)) => demo.clone(),
            _ => Demographics {
                region: String::new(),
                age: 30,
                income: Decimal::ZERO,
                occupation: String::new(),
                joint_family_status: false,
                language_preference: "english".to_string(),
                religious_event_participation: false,
                festival_spending: Decimal::ZERO,
                gold_investment_ratio: 0.0,
                real_estate_allocation: 0.0,
            },
        };

        let mut demo = draft.clone();
        macro_rules! ask {
            ($label:expr, $default:expr, $apply:expr) => {
                match self.field($label, Some(&$default.to_string())).await? {
                    Input::Value(v) => {
                        if let Some(v) = v {
                            $apply(&mut demo, v);
                        }
                    }
                    other => return Ok(nav(other)),
                }
            };
        }

        ask!("Region", draft.region, |d: &mut Demographics, v: String| {
            d.region = v
        });
        ask!("Age", draft.age, |d: &mut Demographics, v: String| {
            d.age = v.parse().unwrap_or(d.age)
        });
        ask!(
            "Annual income (₹)",
            draft.income,
            |d: &mut Demographics, v: String| {
                d.income = Decimal::from_str(&v).unwrap_or(d.income)
            }
        );
        ask!(
            "Occupation",
            draft.occupation,
            |d: &mut Demographics, v: String| d.occupation = v
        );
        ask!(
            "Language preference",
            draft.language_preference,
            |d: &mut Demographics, v: String| d.language_preference = v
        );
        ask!(
            "Joint family household? [y/n]",
            yes_no(draft.joint_family_status),
            |d: &mut Demographics, v: String| d.joint_family_status = is_yes(&v)
        );
        ask!(
            "Participate in religious events? [y/n]",
            yes_no(draft.religious_event_participation),
            |d: &mut Demographics, v: String| d.religious_event_participation = is_yes(&v)
        );
        ask!(
            "Annual festival spending (₹)",
            draft.festival_spending,
            |d: &mut Demographics, v: String| {
                d.festival_spending = Decimal::from_str(&v).unwrap_or(d.festival_spending)
            }
        );
        ask!(
            "Gold investment ratio (% of portfolio)",
            draft.gold_investment_ratio,
            |d: &mut Demographics, v: String| {
                d.gold_investment_ratio = v.parse().unwrap_or(d.gold_investment_ratio)
            }
        );
        ask!(
            "Real estate allocation (% of portfolio)",
            draft.real_estate_allocation,
            |d: &mut Demographics, v: String| {
                d.real_estate_allocation = v.parse().unwrap_or(d.real_estate_allocation)
            }
        );

        self.controller
            .enter_draft(StepPayload::Demographics(demo))
            .await?;
        Ok(Action::Advance)
    }

    async fn collect_behavioral(&mut self, session: &WizardSession) -> anyhow::Result<Action> {
        let draft = match session.payload(WizardStep::Behavioral) {
            Some(StepPayload::Behavioral(data)) => data.clone(),
            _ => BehavioralData {
                portfolio_check_frequency: CheckFrequency::Weekly,
                portfolio_turnover_rate: 0.2,
                major_life_event_occurred: false,
                investment_experience_years: 2,
                risk_tolerance_self_assessment: 5,
                emotional_reaction_to_losses: LossReaction::Concerned,
                decision_making_style: DecisionStyle::Analytical,
            },
        };
        let mut data = draft.clone();

        println!("These answers feed the behavioral (B-score) assessment.");

        match self
            .field(
                "How often do you check your portfolio? [daily/weekly/monthly/rarely]",
                Some("weekly"),
            )
            .await?
        {
            Input::Value(v) => {
                data.portfolio_check_frequency = match v.as_deref() {
                    Some("daily") => CheckFrequency::Daily,
                    Some("monthly") => CheckFrequency::Monthly,
                    Some("rarely") => CheckFrequency::Rarely,
                    Some("weekly") => CheckFrequency::Weekly,
                    _ => draft.portfolio_check_frequency,
                }
            }
            other => return Ok(nav(other)),
        }
        match self
            .field(
                "Annual portfolio turnover (0.0–1.0)",
                Some(&draft.portfolio_turnover_rate.to_string()),
            )
            .await?
        {
            Input::Value(v) => {
                if let Some(v) = v {
                    data.portfolio_turnover_rate = v.parse().unwrap_or(draft.portfolio_turnover_rate);
                }
            }
            other => return Ok(nav(other)),
        }
        match self
            .field(
                "Years of investment experience",
                Some(&draft.investment_experience_years.to_string()),
            )
            .await?
        {
            Input::Value(v) => {
                if let Some(v) = v {
                    data.investment_experience_years =
                        v.parse().unwrap_or(draft.investment_experience_years);
                }
            }
            other => return Ok(nav(other)),
        }
        match self
            .field(
                "Self-assessed risk tolerance (1–10)",
                Some(&draft.risk_tolerance_self_assessment.to_string()),
            )
            .await?
        {
            Input::Value(v) => {
                if let Some(v) = v {
                    data.risk_tolerance_self_assessment =
                        v.parse().unwrap_or(draft.risk_tolerance_self_assessment);
                }
            }
            other => return Ok(nav(other)),
        }
        match self
            .field(
                "Reaction to losses? [calm/concerned/anxious/panicked]",
                Some("concerned"),
            )
            .await?
        {
            Input::Value(v) => {
                data.emotional_reaction_to_losses = match v.as_deref() {
                    Some("calm") => LossReaction::Calm,
                    Some("anxious") => LossReaction::Anxious,
                    Some("panicked") => LossReaction::Panicked,
                    Some("concerned") => LossReaction::Concerned,
                    _ => draft.emotional_reaction_to_losses,
                }
            }
            other => return Ok(nav(other)),
        }
        match self
            .field(
                "Decision style? [analytical/intuitive/emotional]",
                Some("analytical"),
            )
            .await?
        {
            Input::Value(v) => {
                data.decision_making_style = match v.as_deref() {
                    Some("intuitive") => DecisionStyle::Intuitive,
                    Some("emotional") => DecisionStyle::Emotional,
                    Some("analytical") => DecisionStyle::Analytical,
                    _ => draft.decision_making_style,
                }
            }
            other => return Ok(nav(other)),
        }
        match self
            .field("Major life event recently? [y/n]", Some("n"))
            .await?
        {
            Input::Value(v) => {
                if let Some(v) = v {
                    data.major_life_event_occurred = is_yes(&v);
                }
            }
            other => return Ok(nav(other)),
        }

        self.controller
            .enter_draft(StepPayload::Behavioral(data))
            .await?;
        Ok(Action::Advance)
    }

    /// Informational step: any plain Enter advances.
    async fn confirm(&mut self, prompt: &str) -> anyhow::Result<Action> {
        match self.field(prompt, None).await? {
            Input::Value(_) => Ok(Action::Advance),
            other => Ok(nav(other)),
        }
    }

    /// Prompt for one field. Empty input keeps the shown default.
    async fn field(&mut self, label: &str, default: Option<&str>) -> anyhow::Result<Input> {
        match default {
            Some(default) if !default.is_empty() => eprint!("{label} [{default}]: "),
            _ => eprint!("{label}: "),
        }
        let line = self.lines.next_line().await?.unwrap_or_default();
        let line = line.trim();
        Ok(match line {
            "/back" => Input::Back,
            "/skip" => Input::Skip,
            "/quit" => Input::Quit,
            "" => Input::Value(None),
            value => Input::Value(Some(value.to_string())),
        })
    }
}

fn nav(input: Input) -> Action {
    match input {
        Input::Back => Action::Back,
        Input::Skip => Action::Skip,
        Input::Quit => Action::Quit,
        Input::Value(_) => Action::Advance,
    }
}

fn nonempty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

fn yes_no(value: bool) -> &'static str {
    if value { "y" } else { "n" }
}

fn is_yes(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "y" | "yes" | "true")
}

fn render_header(session: &WizardSession) {
    let step = session.current;
    let total = WizardStep::ALL.len();
    let filled = (session.progress() * 20.0).round() as usize;
    println!();
    println!(
        "── Step {} of {total}: {} ──",
        step.number(),
        step.title()
    );
    println!("[{}{}]", "#".repeat(filled), "-".repeat(20 - filled.min(20)));
}

/// Show whatever the backend acknowledged for the step that just landed.
fn render_acknowledgment(step: WizardStep, session: &WizardSession) {
    match step {
        WizardStep::PersonalInfo => {
            if let Some(profile) = &session.scores.profile {
                println!("✅ Profile updated for {} {}.", profile.first_name, profile.last_name);
            }
        }
        WizardStep::KycUpload => {
            if let Some(document) = &session.scores.kyc {
                println!("✅ Document received, verification {:?}.", document.status);
            }
        }
        WizardStep::Questionnaire => {
            if let Some(scored) = &session.scores.questionnaire {
                println!("✅ Q-score {:.1} (risk score {:.1}).", scored.q_score, scored.risk_score);
            }
        }
        WizardStep::Demographics => {
            if let Some(factors) = &session.scores.demographics {
                println!("✅ Cultural modifier {:.2}.", factors.cultural_modifier);
            }
        }
        WizardStep::Behavioral => {
            if let Some(scored) = &session.scores.behavioral {
                println!("✅ B-score {:.1}.", scored.b_score);
                for insight in &scored.behavioral_insights {
                    println!("   • {insight}");
                }
            }
        }
        WizardStep::Calculate => {
            if let Some(profile) = &session.scores.risk_profile {
                println!(
                    "✅ Risk profile: {} ({:.1}, confidence {:.0}%).",
                    profile.risk_category,
                    profile.risk_score,
                    profile.confidence * 100.0
                );
            }
        }
        _ => {}
    }
}

fn render_summary(session: &WizardSession) {
    println!("Profile complete!");
    if let Some(profile) = &session.scores.risk_profile {
        println!("  Category:   {}", profile.risk_category);
        println!("  Risk score: {:.1}", profile.risk_score);
        println!("  Q-score:    {:.1}", profile.factors.q_score);
        println!("  G-score:    {:.1}", profile.factors.g_score);
        println!("  B-score:    {:.1}", profile.factors.b_score);
        println!("  Confidence: {:.0}%", profile.confidence * 100.0);
    }
}
