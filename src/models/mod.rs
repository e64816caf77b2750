//! The APD domain registry.
//!
//! An advance planning document owns its activities; each activity owns its
//! goals, milestones, state personnel, contractor resources, and expenses.
//! Per-year dollar amounts are stored as JSON text keyed by federal fiscal
//! year.

use crate::db::{FieldKind, FieldSpec, ModelDescriptor, Ownership, Registry, Rule};

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Text,
    }
}

const fn real(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Real,
    }
}

const fn json(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Json,
    }
}

const APD: ModelDescriptor = ModelDescriptor {
    name: "apd",
    table: "apd",
    foreign_key: "apd_id",
    updateable: &[
        text("status"),
        text("period"),
        text("program_overview"),
        text("narrative_hit"),
        text("narrative_hie"),
        text("narrative_mmis"),
    ],
    owns: &[Ownership {
        property: "activities",
        child: "activity",
    }],
    rules: &[],
};

// Activity names must be unique within their APD; the synchronizer's
// delete-before-write ordering exists so a name freed by a deletion in the
// same call can be taken by a new activity.
const ACTIVITY: ModelDescriptor = ModelDescriptor {
    name: "activity",
    table: "activity",
    foreign_key: "activity_id",
    updateable: &[
        text("name"),
        text("summary"),
        text("description"),
        text("alternatives"),
        text("cost_allocation_methodology"),
        text("other_funding_description"),
        real("other_funding_amount"),
    ],
    owns: &[
        Ownership {
            property: "goals",
            child: "goal",
        },
        Ownership {
            property: "milestones",
            child: "milestone",
        },
        Ownership {
            property: "state_personnel",
            child: "state_personnel",
        },
        Ownership {
            property: "contractor_resources",
            child: "contractor_resource",
        },
        Ownership {
            property: "expenses",
            child: "expense",
        },
    ],
    rules: &[
        Rule::Required { field: "name" },
        Rule::UniqueWithinParent { field: "name" },
        Rule::NonNegative {
            field: "other_funding_amount",
        },
    ],
};

const GOAL: ModelDescriptor = ModelDescriptor {
    name: "goal",
    table: "goal",
    foreign_key: "goal_id",
    updateable: &[text("description"), text("objective")],
    owns: &[],
    rules: &[],
};

const MILESTONE: ModelDescriptor = ModelDescriptor {
    name: "milestone",
    table: "milestone",
    foreign_key: "milestone_id",
    updateable: &[text("name"), text("starts_on"), text("ends_on")],
    owns: &[],
    rules: &[],
};

const STATE_PERSONNEL: ModelDescriptor = ModelDescriptor {
    name: "state_personnel",
    table: "state_personnel",
    foreign_key: "state_personnel_id",
    updateable: &[text("title"), text("description"), json("years")],
    owns: &[],
    rules: &[],
};

const CONTRACTOR_RESOURCE: ModelDescriptor = ModelDescriptor {
    name: "contractor_resource",
    table: "contractor_resource",
    foreign_key: "contractor_resource_id",
    updateable: &[
        text("name"),
        text("description"),
        text("starts_on"),
        text("ends_on"),
        json("years"),
    ],
    owns: &[],
    rules: &[],
};

const EXPENSE: ModelDescriptor = ModelDescriptor {
    name: "expense",
    table: "expense",
    foreign_key: "expense_id",
    updateable: &[text("category"), text("description"), json("years")],
    owns: &[],
    rules: &[],
};

/// Build the registry of every APD model.
pub fn registry() -> Registry {
    Registry::new([
        APD,
        ACTIVITY,
        GOAL,
        MILESTONE,
        STATE_PERSONNEL,
        CONTRACTOR_RESOURCE,
        EXPENSE,
    ])
}
