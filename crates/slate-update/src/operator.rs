use std::fmt;

/// Every update operator the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOperator {
    Set,
    Unset,
    SetOnInsert,
    CurrentDate,
    Inc,
    Mul,
    Min,
    Max,
    Rename,
    Bit,
    AddToSet,
    Push,
    Pop,
    Pull,
    PullAll,
}

impl UpdateOperator {
    pub const ALL: [UpdateOperator; 15] = [
        UpdateOperator::Set,
        UpdateOperator::Unset,
        UpdateOperator::SetOnInsert,
        UpdateOperator::CurrentDate,
        UpdateOperator::Inc,
        UpdateOperator::Mul,
        UpdateOperator::Min,
        UpdateOperator::Max,
        UpdateOperator::Rename,
        UpdateOperator::Bit,
        UpdateOperator::AddToSet,
        UpdateOperator::Push,
        UpdateOperator::Pop,
        UpdateOperator::Pull,
        UpdateOperator::PullAll,
    ];

    /// Look up an operator by its key in an update document, e.g. `"$inc"`.
    pub fn from_name(name: &str) -> Option<UpdateOperator> {
        UpdateOperator::ALL
            .into_iter()
            .find(|op| op.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            UpdateOperator::Set => "$set",
            UpdateOperator::Unset => "$unset",
            UpdateOperator::SetOnInsert => "$setOnInsert",
            UpdateOperator::CurrentDate => "$currentDate",
            UpdateOperator::Inc => "$inc",
            UpdateOperator::Mul => "$mul",
            UpdateOperator::Min => "$min",
            UpdateOperator::Max => "$max",
            UpdateOperator::Rename => "$rename",
            UpdateOperator::Bit => "$bit",
            UpdateOperator::AddToSet => "$addToSet",
            UpdateOperator::Push => "$push",
            UpdateOperator::Pop => "$pop",
            UpdateOperator::Pull => "$pull",
            UpdateOperator::PullAll => "$pullAll",
        }
    }
}

impl fmt::Display for UpdateOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
