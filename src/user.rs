use diesel::prelude::*;

use crate::db::{Connection, Result};
use crate::schema::users;
use crate::types::{Id, Time};

#[derive(Queryable, Identifiable, PartialEq, Debug, Clone)]
#[diesel(table_name = users)]
pub struct User {
	pub id: Id,
	pub username: String,
	/// argon2 PHC string
	pub password: String,
	pub first_name: String,
	pub last_name: String,
	pub email: String,
	pub date_joined: Time,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
	pub username: &'a str,
	pub password: &'a str,
	pub first_name: &'a str,
	pub last_name: &'a str,
	pub email: &'a str,
	pub date_joined: Time,
}

pub enum UserKey<'a> {
	ID(Id),
	Username(&'a str),
}

pub struct Repo<'a> {
	db: &'a mut Connection,
}

impl<'a> Repo<'a> {
	pub fn new(db: &'a mut Connection) -> Self {
		Repo { db }
	}
	
	pub fn create(&mut self, new_user: NewUser) -> Result<User> {
		diesel::insert_into(users::table)
			.values(&new_user)
			.get_result(self.db)
			.map_err(Into::into)
	}
	
	pub fn find(&mut self, key: UserKey) -> Result<User> {
		match key {
			UserKey::ID(id) => {
				users::table
					.find(id)
					.first::<User>(self.db)
					.map_err(Into::into)
			}
			UserKey::Username(username) => {
				users::table
					.filter(users::username.eq(username))
					.first::<User>(self.db)
					.map_err(Into::into)
			}
		}
	}
	
	/// Delete the user row only; owned rows must be gone already
	pub fn delete(&mut self, id: Id) -> Result<()> {
		let deleted = diesel::delete(users::table.find(id)).execute(self.db)?;
		if deleted == 0 {
			return Err(crate::db::Error::RecordNotFound);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use crate::db::Error;
	use crate::testutil::*;
	
	use super::*;
	
	#[test]
	fn create_user() {
		let fixture = Fixture::new();
		let conn = &mut fixture.conn();
		let joined = time("2024-03-01 09:30:00");
		
		let user = Repo::new(conn).create(NewUser {
			username: "tom",
			password: "hash",
			first_name: "Tom",
			last_name: "Riddle",
			email: "tom@example.com",
			date_joined: joined,
		}).unwrap();
		
		let got = users::table.find(user.id).first::<User>(conn).unwrap();
		assert_eq!(got, user);
		assert_eq!(got.date_joined, joined);
	}
	
	#[test]
	fn find_user_with_key() {
		let fixture = Fixture::new();
		let user = fixture.user("bob");
		let conn = &mut fixture.conn();
		
		let test_cases = vec![
			UserKey::Username("bob"),
			UserKey::ID(user.id),
		];
		
		for key in test_cases {
			let got = Repo::new(conn).find(key).expect("found user");
			assert_eq!(got, user);
		}
	}
	
	#[test]
	fn duplicate_username() {
		let fixture = Fixture::new();
		fixture.user("bob");
		let conn = &mut fixture.conn();
		
		let err = Repo::new(conn).create(NewUser {
			username: "bob",
			..UserFactory::defaults()
		}).unwrap_err();
		
		assert!(matches!(err, Error::RecordAlreadyExists));
	}
	
	#[test]
	fn delete_missing_user() {
		let fixture = Fixture::new();
		let conn = &mut fixture.conn();
		
		let err = Repo::new(conn).delete(404).unwrap_err();
		assert!(matches!(err, Error::RecordNotFound));
	}
}
