use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Persona a user declares before preset questions are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Parent,
    General,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Parent => "parent",
            Role::General => "general",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            "parent" => Some(Role::Parent),
            "general" => Some(Role::General),
            _ => None,
        }
    }

    pub fn all() -> Vec<Role> {
        vec![Role::Student, Role::Teacher, Role::Parent, Role::General]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Teacher => "Teacher",
            Role::Parent => "Parent",
            Role::General => "General",
        }
    }
}

/// Static role -> ordered question list mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetQuestions(BTreeMap<Role, Vec<String>>);

impl PresetQuestions {
    pub fn new(map: BTreeMap<Role, Vec<String>>) -> Self {
        Self(map)
    }

    /// Questions for `role`, or an empty slice when the mapping has no entry
    pub fn for_role(&self, role: Role) -> &[String] {
        self.0.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for PresetQuestions {
    fn default() -> Self {
        let general = vec![
            "What is DTE EMIS?",
            "How do I log in to DTE EMIS?",
            "Where can I find the user manual?",
            "Who can I contact for support?",
            "What is the official website for DTE EMIS?",
        ];
        let student = vec![
            "How do I log in to DTE EMIS?",
            "Where can I find the user manual?",
            "Who can I contact for support?",
        ];
        let teacher = vec![
            "How do I log in to DTE EMIS?",
            "How do I update my faculty profile?",
            "Where can I find the user manual?",
        ];
        let parent = vec![
            "What is DTE EMIS?",
            "What is the official website for DTE EMIS?",
            "Who can I contact for support?",
        ];

        let owned = |qs: Vec<&str>| qs.into_iter().map(String::from).collect::<Vec<_>>();
        let mut map = BTreeMap::new();
        map.insert(Role::Student, owned(student));
        map.insert(Role::Teacher, owned(teacher));
        map.insert(Role::Parent, owned(parent));
        map.insert(Role::General, owned(general));
        Self(map)
    }
}

/// Role selection state. `None` means no role chosen yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleGate {
    role: Option<Role>,
}

impl RoleGate {
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn is_unset(&self) -> bool {
        self.role.is_none()
    }

    /// Only valid while unset. Returns whether the role changed.
    pub fn select(&mut self, role: Role) -> bool {
        if self.role.is_some() {
            return false;
        }
        self.role = Some(role);
        true
    }

    pub fn reset(&mut self) {
        self.role = None;
    }
}
