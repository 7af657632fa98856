//! Enumerated column domains.
//!
//! Every enum is stored as its kebab-case string in a `TEXT` column guarded
//! by a `CHECK` constraint, so the string forms here must match
//! `migrations/0001_initial.sql`.

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => ($value:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }

            /// Human-readable label shown in pages and spreadsheets.
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($value => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Comma-separated list of accepted values, for error messages.
            pub fn expected() -> String {
                Self::ALL
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice_enum! {
    UserRole {
        Developer => ("developer", "Developer"),
        Manager => ("manager", "Project Manager"),
        Tester => ("tester", "Tester"),
        Designer => ("designer", "Designer"),
        Analyst => ("analyst", "Business Analyst"),
    }
}

choice_enum! {
    ProjectStatus {
        Planning => ("planning", "Planning"),
        Development => ("development", "Development"),
        Testing => ("testing", "Testing"),
        Completed => ("completed", "Completed"),
        OnHold => ("on-hold", "On Hold"),
    }
}

choice_enum! {
    ApplicationStatus {
        Planning => ("planning", "Planning"),
        Ready => ("ready", "Ready"),
        Development => ("development", "Development"),
        Testing => ("testing", "Testing"),
        Production => ("production", "Production"),
    }
}

choice_enum! {
    ApplicationComplexity {
        Simple => ("simple", "Simple"),
        Medium => ("medium", "Medium"),
        High => ("high", "High"),
    }
}

choice_enum! {
    ArtifactType {
        Requirements => ("requirements", "Requirements"),
        Code => ("code", "Code"),
        Documentation => ("documentation", "Documentation"),
        Architecture => ("architecture", "Architecture"),
        Design => ("design", "Design"),
    }
}

choice_enum! {
    ArtifactStatus {
        Draft => ("draft", "Draft"),
        InProgress => ("in-progress", "In Progress"),
        Review => ("review", "Review"),
        Complete => ("complete", "Complete"),
    }
}

choice_enum! {
    TaskStatus {
        Pending => ("pending", "Pending"),
        InProgress => ("in-progress", "In Progress"),
        Completed => ("completed", "Completed"),
        Blocked => ("blocked", "Blocked"),
    }
}

choice_enum! {
    TaskPriority {
        Low => ("low", "Low"),
        Medium => ("medium", "Medium"),
        High => ("high", "High"),
        Critical => ("critical", "Critical"),
    }
}

choice_enum! {
    TaskAssignee {
        Claude => ("claude", "Claude"),
        GithubCopilot => ("github-copilot", "GitHub Copilot"),
        Human => ("human", "Human"),
        Team => ("team", "Team"),
    }
}

choice_enum! {
    DecisionStatus {
        Pending => ("pending", "Pending"),
        Decided => ("decided", "Decided"),
        Implemented => ("implemented", "Implemented"),
        Changed => ("changed", "Changed"),
    }
}

choice_enum! {
    DecisionImpact {
        Low => ("low", "Low"),
        Medium => ("medium", "Medium"),
        High => ("high", "High"),
        Critical => ("critical", "Critical"),
    }
}

choice_enum! {
    IntegrationType {
        DataSharing => ("data-sharing", "Data Sharing"),
        UiIntegration => ("ui-integration", "UI Integration"),
        ApiIntegration => ("api-integration", "API Integration"),
        FullMerge => ("full-merge", "Full Merge"),
    }
}

choice_enum! {
    IntegrationStatus {
        Planned => ("planned", "Planned"),
        InProgress => ("in-progress", "In Progress"),
        Completed => ("completed", "Completed"),
        Blocked => ("blocked", "Blocked"),
    }
}

choice_enum! {
    IntegrationComplexity {
        Simple => ("simple", "Simple"),
        Medium => ("medium", "Medium"),
        Complex => ("complex", "Complex"),
    }
}

impl IntegrationComplexity {
    /// Factor applied to the base estimate of an integration.
    pub fn multiplier(&self) -> f64 {
        match self {
            IntegrationComplexity::Simple => 1.0,
            IntegrationComplexity::Medium => 1.5,
            IntegrationComplexity::Complex => 2.5,
        }
    }
}
