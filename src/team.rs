use std::collections::BTreeMap;

use serde::Serialize;
use taskboard_common::{Member, Role};
use tracing::info;

use crate::api::{BoardApi, UpdateMemberRequest};
use crate::errors::{BoardError, BoardResult};
use crate::events::{BoardEvent, EventBus};

/// Project members indexed by role.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TeamDirectory {
    members: Vec<Member>,
    roles: Vec<Role>,
}

impl TeamDirectory {
    pub fn new(members: Vec<Member>, roles: Vec<Role>) -> Self {
        Self { members, roles }
    }

    pub async fn fetch(api: &dyn BoardApi, project_id: i64) -> BoardResult<Self> {
        let (members, roles) =
            tokio::try_join!(api.list_members(project_id), api.list_roles(project_id))?;
        Ok(Self::new(members, roles))
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn member(&self, member_id: i64) -> Option<&Member> {
        self.members.iter().find(|m| m.id == member_id)
    }

    pub fn role(&self, role_id: i64) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == role_id)
    }

    pub fn role_of(&self, member_id: i64) -> Option<&Role> {
        self.member(member_id).and_then(|m| self.role(m.role_id))
    }

    pub fn members_with_role(&self, role_id: i64) -> Vec<&Member> {
        self.members.iter().filter(|m| m.role_id == role_id).collect()
    }

    /// Role id -> members, for every known role (empty roles included).
    pub fn by_role(&self) -> BTreeMap<i64, Vec<&Member>> {
        let mut grouped: BTreeMap<i64, Vec<&Member>> =
            self.roles.iter().map(|r| (r.id, Vec::new())).collect();
        for member in &self.members {
            grouped.entry(member.role_id).or_default().push(member);
        }
        grouped
    }

    pub fn admins(&self) -> Vec<&Member> {
        self.members.iter().filter(|m| m.is_admin).collect()
    }

    /// Roles whose members give point estimates.
    pub fn computable_roles(&self) -> Vec<&Role> {
        self.roles.iter().filter(|r| r.computable).collect()
    }

    /// Persist a role change, then update the directory and publish
    /// `MemberRoleChanged`.
    pub async fn change_role(
        &mut self,
        api: &dyn BoardApi,
        bus: &EventBus,
        member_id: i64,
        role_id: i64,
    ) -> BoardResult<&Member> {
        if self.member(member_id).is_none() {
            return Err(BoardError::MemberNotFound { id: member_id });
        }
        if self.role(role_id).is_none() {
            return Err(BoardError::RoleNotFound { id: role_id });
        }
        let updated = api
            .update_member_role(member_id, &UpdateMemberRequest { role_id })
            .await?;
        info!(member_id, role_id, "member role changed");
        bus.publish(BoardEvent::MemberRoleChanged { member_id, role_id });

        let slot = self
            .members
            .iter_mut()
            .find(|m| m.id == member_id)
            .ok_or(BoardError::MemberNotFound { id: member_id })?;
        *slot = updated;
        Ok(slot)
    }
}
