use diesel::prelude::*;
use uuid::Uuid;

use crate::db::{Connection, Result};
use crate::schema::sessions;
use crate::types::{Id, Time};
use crate::user::User;

/// Server-side record of a signed-in user
///
/// The token is the only thing handed to the client.
#[derive(Queryable, Identifiable, Associations, PartialEq, Debug, Clone)]
#[diesel(belongs_to(User))]
#[diesel(table_name = sessions, primary_key(token))]
pub struct Session {
	pub token: String,
	pub user_id: Id,
	pub created_at: Time,
}

#[derive(Insertable)]
#[diesel(table_name = sessions)]
struct NewSession<'a> {
	token: &'a str,
	user_id: Id,
	created_at: Time,
}

pub struct Repo<'a> {
	db: &'a mut Connection,
}

impl<'a> Repo<'a> {
	pub fn new(db: &'a mut Connection) -> Self {
		Repo { db }
	}
	
	/// Issue a fresh random token for the user
	pub fn create(&mut self, user_id: Id, created_at: Time) -> Result<Session> {
		let token = Uuid::new_v4().to_string();
		diesel::insert_into(sessions::table)
			.values(&NewSession { token: &token, user_id, created_at })
			.get_result(self.db)
			.map_err(Into::into)
	}
	
	pub fn find(&mut self, token: &str) -> Result<Session> {
		sessions::table
			.find(token)
			.first::<Session>(self.db)
			.map_err(Into::into)
	}
	
	pub fn delete(&mut self, token: &str) -> Result<usize> {
		diesel::delete(sessions::table.find(token))
			.execute(self.db)
			.map_err(Into::into)
	}
	
	pub fn delete_for_user(&mut self, user_id: Id) -> Result<usize> {
		diesel::delete(sessions::table.filter(sessions::user_id.eq(user_id)))
			.execute(self.db)
			.map_err(Into::into)
	}
}

#[cfg(test)]
mod tests {
	use crate::db::Error;
	use crate::testutil::*;
	
	use super::*;
	
	#[test]
	fn issue_and_find_session() {
		let fixture = Fixture::new();
		let user = fixture.user("bob");
		let conn = &mut fixture.conn();
		
		let session = Repo::new(conn).create(user.id, time("2024-03-01 12:00:00")).unwrap();
		assert_eq!(session.token.len(), 36);
		
		let got = Repo::new(conn).find(&session.token).unwrap();
		assert_eq!(got, session);
	}
	
	#[test]
	fn tokens_differ_per_session() {
		let fixture = Fixture::new();
		let user = fixture.user("bob");
		let conn = &mut fixture.conn();
		
		let mut repo = Repo::new(conn);
		let first = repo.create(user.id, time("2024-03-01 12:00:00")).unwrap();
		let second = repo.create(user.id, time("2024-03-01 12:00:00")).unwrap();
		
		assert_ne!(first.token, second.token);
		assert_eq!(repo.delete_for_user(user.id).unwrap(), 2);
	}
	
	#[test]
	fn deleted_session_is_gone() {
		let fixture = Fixture::new();
		let user = fixture.user("bob");
		let conn = &mut fixture.conn();
		
		let mut repo = Repo::new(conn);
		let session = repo.create(user.id, time("2024-03-01 12:00:00")).unwrap();
		assert_eq!(repo.delete(&session.token).unwrap(), 1);
		
		assert!(matches!(repo.find(&session.token), Err(Error::RecordNotFound)));
	}
}
