use clap::Args;
use leaddesk_protocol::FieldPatch;
use leaddesk_protocol::LeadPatch;

/// Field edits shared by `update` and `bulk-update`. A field named by neither
/// of its flags is left untouched.
#[derive(Debug, Default, Args)]
pub struct PatchArgs {
    /// New name. Names cannot be cleared.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    #[arg(long, value_name = "PHONE", conflicts_with = "clear_phone")]
    pub phone: Option<String>,

    #[arg(long)]
    pub clear_phone: bool,

    #[arg(long, value_name = "EMAIL", conflicts_with = "clear_email")]
    pub email: Option<String>,

    #[arg(long)]
    pub clear_email: bool,

    #[arg(long, value_name = "TEXT", conflicts_with = "clear_comment")]
    pub comment: Option<String>,

    #[arg(long)]
    pub clear_comment: bool,

    #[arg(long = "status", value_name = "STATUS_ID", conflicts_with = "clear_status")]
    pub status: Option<String>,

    #[arg(long)]
    pub clear_status: bool,

    #[arg(long = "tag", value_name = "TAG_ID", conflicts_with = "clear_tag")]
    pub tag: Option<String>,

    #[arg(long)]
    pub clear_tag: bool,

    /// Replace the assignees. Repeat for several users.
    #[arg(long = "assign", value_name = "USER_ID", conflicts_with = "unassign")]
    pub assign: Vec<String>,

    /// Remove every assignee.
    #[arg(long)]
    pub unassign: bool,
}

impl PatchArgs {
    pub fn to_patch(&self) -> LeadPatch {
        LeadPatch {
            name: FieldPatch::from_parts(self.name.clone(), false),
            phone: FieldPatch::from_parts(self.phone.clone(), self.clear_phone),
            email: FieldPatch::from_parts(self.email.clone(), self.clear_email),
            comment: FieldPatch::from_parts(self.comment.clone(), self.clear_comment),
            status_id: FieldPatch::from_parts(self.status.clone(), self.clear_status),
            tag_id: FieldPatch::from_parts(self.tag.clone(), self.clear_tag),
            assigned_to: FieldPatch::from_parts(
                (!self.assign.is_empty()).then(|| self.assign.clone()),
                self.unassign,
            ),
        }
    }
}
