//! BalancEED client core
//!
//! Exercise engine, scoring, survey and registration model shared by the
//! API client and the terminal front end.

pub mod attempt;
pub mod config;
pub mod error;
pub mod exercise;
pub mod forms;
pub mod models;
pub mod registration;
pub mod scoring;
pub mod survey;

pub use attempt::{Attempt, AttemptSnapshot, AttemptStatus, ExerciseRunner};
pub use config::{Config, DemoCredentials};
pub use error::{BalanceedError, Result};
pub use exercise::{Answer, Category, ChoiceQuestion, Exercise, ExerciseItems, ExerciseKind, Problem};
pub use forms::{
    ContactForm, DonationForm, FormInput, JournalEntry, LifeSkillTask, NutritionLog,
    ProgressEntry, RegisterProfile,
};
pub use models::{
    AuthResponse, ChatMessage, ChatRoom, DashboardData, DemoSetup, LifeSkill, LoginRequest,
    NewChatRoom, Pathway, TradeModule, TrainingProgress, User,
};
pub use registration::{RegistrationWizard, Step};
pub use scoring::{score, ExerciseResult};
pub use survey::{static_questions, QuestionKind, SurveyAnswer, SurveyQuestion};
